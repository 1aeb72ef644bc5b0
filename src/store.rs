//! Persistence contract (load / versioned save / subscribe) and an in-memory implementation.

use crate::models::{CoreError, Game, GameId, Tournament, TournamentId};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock};
use tokio::sync::watch;

/// A document that can be stored: has an id and a write version.
pub trait Record: Clone + Send + Sync + 'static {
    type Id: Copy + Eq + Hash + Send + Sync + 'static;

    fn id(&self) -> Self::Id;
    fn version(&self) -> u64;
    fn set_version(&mut self, version: u64);
    fn not_found(id: Self::Id) -> CoreError;
}

impl Record for Game {
    type Id = GameId;

    fn id(&self) -> GameId {
        self.id
    }
    fn version(&self) -> u64 {
        self.version
    }
    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
    fn not_found(id: GameId) -> CoreError {
        CoreError::GameNotFound(id)
    }
}

impl Record for Tournament {
    type Id = TournamentId;

    fn id(&self) -> TournamentId {
        self.id
    }
    fn version(&self) -> u64 {
        self.version
    }
    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
    fn not_found(id: TournamentId) -> CoreError {
        CoreError::TournamentNotFound(id)
    }
}

/// Document storage used by the services.
pub trait Repository<T: Record>: Send + Sync {
    fn load(&self, id: T::Id) -> Result<T, CoreError>;

    /// Write a record read at `record.version()`. Fails with `ConcurrencyHazard` if someone
    /// else wrote in between. Returns the record with its new version.
    fn save(&self, record: T) -> Result<T, CoreError>;

    /// Receiver that always holds the latest written state. Drop it to unsubscribe.
    fn subscribe(&self, id: T::Id) -> Result<watch::Receiver<T>, CoreError>;

    fn list(&self) -> Vec<T>;
}

/// Records kept in memory, one watch channel per record.
pub struct MemoryStore<T: Record> {
    entries: RwLock<HashMap<T::Id, watch::Sender<T>>>,
}

impl<T: Record> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Record> MemoryStore<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Record> Repository<T> for MemoryStore<T> {
    fn load(&self, id: T::Id) -> Result<T, CoreError> {
        let g = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        g.get(&id)
            .map(|tx| tx.borrow().clone())
            .ok_or_else(|| T::not_found(id))
    }

    fn save(&self, mut record: T) -> Result<T, CoreError> {
        let mut g = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let stored = g.get(&record.id()).map(|tx| tx.borrow().version()).unwrap_or(0);
        if stored != record.version() {
            return Err(CoreError::ConcurrencyHazard {
                expected: record.version(),
                found: stored,
            });
        }
        record.set_version(stored + 1);
        match g.get(&record.id()) {
            Some(tx) => {
                tx.send_replace(record.clone());
            }
            None => {
                let (tx, _) = watch::channel(record.clone());
                g.insert(record.id(), tx);
            }
        }
        Ok(record)
    }

    fn subscribe(&self, id: T::Id) -> Result<watch::Receiver<T>, CoreError> {
        let g = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        g.get(&id).map(watch::Sender::subscribe).ok_or_else(|| T::not_found(id))
    }

    fn list(&self) -> Vec<T> {
        let g = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        g.values().map(|tx| tx.borrow().clone()).collect()
    }
}
