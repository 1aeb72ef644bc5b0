//! Stat aggregation contracts, and an in-memory aggregator for players and venues.

use crate::logic::summary::MatchSummary;
use crate::models::{GameId, Goal, Side, Team, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

/// Receives every completed, non-guest game once.
pub trait StatAggregator: Send + Sync {
    fn on_match_completed(&self, game_id: GameId, teams: &[Team; 2], goals: &[Goal], winner: Option<Side>);
}

/// Per-venue game counter.
pub trait VenueStats: Send + Sync {
    fn on_match_completed(&self, venue_id: &str, player_count: usize);
}

/// Career numbers of one player.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub goals: u32,
    pub points: i32,
    pub gamelles: u32,
    pub current_streak: u32,
    pub best_streak: u32,
    pub perfect_games: u32,
    pub remontadas: u32,
}

impl PlayerStats {
    fn record(&mut self, outcome: Option<bool>, summary: &MatchSummary) {
        self.played += 1;
        match outcome {
            Some(true) => {
                self.wins += 1;
                self.current_streak += 1;
                self.best_streak = self.best_streak.max(self.current_streak);
                if summary.perfect_game {
                    self.perfect_games += 1;
                }
                if summary.remontada {
                    self.remontadas += 1;
                }
            }
            Some(false) => {
                self.losses += 1;
                self.current_streak = 0;
            }
            None => {
                self.draws += 1;
                self.current_streak = 0;
            }
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct VenueTally {
    pub games: u32,
    pub player_slots: u32,
}

#[derive(Default)]
struct Ledger {
    players: HashMap<UserId, PlayerStats>,
    /// Wins of the first player over the second.
    head_to_head: HashMap<(UserId, UserId), u32>,
    venues: HashMap<String, VenueTally>,
    applied: HashSet<GameId>,
}

/// Aggregator kept in memory. A game id is applied at most once.
#[derive(Default)]
pub struct MemoryStats {
    ledger: Mutex<Ledger>,
}

impl MemoryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player(&self, user_id: &str) -> Option<PlayerStats> {
        let g = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        g.players.get(user_id).cloned()
    }

    /// `(wins of a over b, wins of b over a)`.
    pub fn head_to_head(&self, a: &str, b: &str) -> (u32, u32) {
        let g = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        let get = |x: &str, y: &str| {
            g.head_to_head
                .get(&(x.to_string(), y.to_string()))
                .copied()
                .unwrap_or(0)
        };
        (get(a, b), get(b, a))
    }

    pub fn venue(&self, venue_id: &str) -> Option<VenueTally> {
        let g = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        g.venues.get(venue_id).cloned()
    }

    pub fn games_recorded(&self) -> usize {
        let g = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        g.applied.len()
    }
}

impl StatAggregator for MemoryStats {
    fn on_match_completed(&self, game_id: GameId, teams: &[Team; 2], goals: &[Goal], winner: Option<Side>) {
        let mut g = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        if !g.applied.insert(game_id) {
            log::debug!("Stats for game {} already recorded", game_id);
            return;
        }
        let summary = MatchSummary::from_parts(game_id, teams, goals, winner);

        for side in Side::BOTH {
            let outcome = winner.map(|w| w == side);
            for player in &teams[side.index()].players {
                let stats = g.players.entry(player.user_id.clone()).or_default();
                stats.record(outcome, &summary);
                if let Some(tally) = summary.tallies.get(&player.user_id) {
                    stats.goals += tally.goals;
                    stats.points += tally.points;
                    stats.gamelles += tally.gamelles;
                }
            }
        }

        if let Some(w) = winner {
            for winner_player in &teams[w.index()].players {
                for loser in &teams[w.opponent().index()].players {
                    *g.head_to_head
                        .entry((winner_player.user_id.clone(), loser.user_id.clone()))
                        .or_default() += 1;
                }
            }
        }
        log::debug!(
            "Recorded stats for game {} (perfect: {}, remontada: {})",
            game_id,
            summary.perfect_game,
            summary.remontada
        );
    }
}

impl VenueStats for MemoryStats {
    fn on_match_completed(&self, venue_id: &str, player_count: usize) {
        let mut g = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        let tally = g.venues.entry(venue_id.to_string()).or_default();
        tally.games += 1;
        tally.player_slots += player_count as u32;
    }
}
