//! Services: game and tournament lifecycles over a store, and the `Clubhouse` facade that
//! routes finished tournament games back into their tournament.

pub mod matches;
pub mod tournaments;

pub use matches::{GameUpdate, GoalRecorded, MatchLifecycle, NewGame};
pub use tournaments::{NewTournament, TournamentLifecycle};

use crate::logic::scoring::GoalInput;
use crate::models::{CoreError, Game, GameId, GameStatus, Side, Tournament};
use crate::stats::MemoryStats;
use crate::store::MemoryStore;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Entry point used by the web server: games, tournaments and stats wired together.
pub struct Clubhouse {
    pub games: Arc<MatchLifecycle>,
    pub tournaments: TournamentLifecycle,
    stats: Arc<MemoryStats>,
}

impl Clubhouse {
    /// Everything in memory. `tournament_ttl` sets how long a tournament stays open.
    pub fn in_memory(tournament_ttl: Duration) -> Self {
        let stats = Arc::new(MemoryStats::new());
        let games = Arc::new(MatchLifecycle::new(
            Arc::new(MemoryStore::<Game>::new()),
            stats.clone(),
            stats.clone(),
        ));
        let tournaments = TournamentLifecycle::new(
            Arc::new(MemoryStore::<Tournament>::new()),
            games.clone(),
            tournament_ttl,
        );
        Self {
            games,
            tournaments,
            stats,
        }
    }

    pub fn stats(&self) -> &MemoryStats {
        &self.stats
    }

    pub fn record_goal(
        &self,
        id: GameId,
        input: &GoalInput,
        expected_version: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<GoalRecorded, CoreError> {
        let recorded = self.games.record_goal(id, input, expected_version, now)?;
        if recorded.completed {
            self.after_completion(&recorded.game)?;
        }
        Ok(recorded)
    }

    pub fn undo_last_goal(&self, id: GameId, expected_version: Option<u64>) -> Result<Game, CoreError> {
        self.games.undo_last_goal(id, expected_version)
    }

    pub fn end_game(&self, id: GameId, now: DateTime<Utc>) -> Result<GameUpdate, CoreError> {
        let update = self.games.end_game(id, now)?;
        self.after_completion(&update.game)?;
        Ok(update)
    }

    pub fn forfeit(&self, id: GameId, forfeiting: Side, now: DateTime<Utc>) -> Result<GameUpdate, CoreError> {
        let update = self.games.forfeit(id, forfeiting, now)?;
        self.after_completion(&update.game)?;
        Ok(update)
    }

    pub fn abandon(&self, id: GameId, now: DateTime<Utc>) -> Result<Game, CoreError> {
        let game = self.games.abandon(id, now)?;
        self.tournaments.on_game_abandoned(&game)?;
        Ok(game)
    }

    /// Deliver a finished game's outcome to its tournament again. Repeating it is harmless.
    pub fn sync_game(&self, id: GameId) -> Result<Game, CoreError> {
        let game = self.games.get(id)?;
        match game.status {
            GameStatus::Completed => self.after_completion(&game)?,
            GameStatus::Abandoned => self.tournaments.on_game_abandoned(&game)?,
            GameStatus::InProgress => return Err(CoreError::InvalidState("game is still in progress")),
        }
        Ok(game)
    }

    /// The game is saved before this runs. A failure leaves the tournament behind the game
    /// until `sync_game` is called; a lost version race is retried once.
    fn after_completion(&self, game: &Game) -> Result<(), CoreError> {
        let completion = match self.tournaments.on_game_completed(game) {
            Err(CoreError::ConcurrencyHazard { .. }) => {
                log::debug!("Tournament changed under game {}; retrying", game.id);
                self.tournaments.on_game_completed(game)
            }
            other => other,
        };
        match completion {
            Ok(Some(c)) if c.tournament_completed => {
                log::info!("Game {} decided its tournament (champion {:?})", game.id, c.champion_id);
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(e) => {
                log::warn!("Tournament not updated after game {}: {}", game.id, e);
                Err(e)
            }
        }
    }
}
