//! Game lifecycle: InProgress -> Completed / Abandoned, with persistence and stat hooks.
//!
//! Each operation loads the game, checks its state, runs the scoring engine and saves
//! the result. A transition into Completed triggers stat aggregation exactly once, from
//! the call that made it; guest games are never aggregated.

use crate::logic::scoring::{self, GoalInput};
use crate::logic::summary::MatchSummary;
use crate::models::{
    CoreError, Game, GameId, GameType, Goal, Player, Side, Team, TeamColor,
    TournamentLink, UserId,
};
use crate::stats::{StatAggregator, VenueStats};
use crate::store::Repository;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;

/// Request to open a game.
#[derive(Clone, Debug)]
pub struct NewGame {
    pub host_id: UserId,
    pub game_type: GameType,
    pub venue_id: Option<String>,
    pub sides: [Vec<Player>; 2],
    pub tournament: Option<TournamentLink>,
}

/// Game after a state change. `completed` is true only for the call that completed it.
#[derive(Clone, Debug)]
pub struct GameUpdate {
    pub game: Game,
    pub completed: bool,
}

#[derive(Clone, Debug)]
pub struct GoalRecorded {
    pub game: Game,
    pub goal: Goal,
    pub completed: bool,
}

/// Both sides field the same number of players (1 or 2), nobody twice.
fn validate_sides(sides: &[Vec<Player>; 2]) -> Result<(), CoreError> {
    let size = sides[0].len();
    if !(1..=2).contains(&size) || sides[1].len() != size {
        return Err(CoreError::InvalidLineup);
    }
    let mut seen = HashSet::new();
    for p in sides.iter().flatten() {
        if !seen.insert(p.user_id.as_str()) {
            return Err(CoreError::DuplicatePlayer(p.user_id.clone()));
        }
    }
    Ok(())
}

pub struct MatchLifecycle {
    games: Arc<dyn Repository<Game>>,
    stats: Arc<dyn StatAggregator>,
    venues: Arc<dyn VenueStats>,
}

impl MatchLifecycle {
    pub fn new(
        games: Arc<dyn Repository<Game>>,
        stats: Arc<dyn StatAggregator>,
        venues: Arc<dyn VenueStats>,
    ) -> Self {
        Self { games, stats, venues }
    }

    pub fn create_game(&self, new: NewGame, now: DateTime<Utc>) -> Result<Game, CoreError> {
        validate_sides(&new.sides)?;
        let [one, two] = new.sides;
        let teams = [
            Team::new(one, TeamColor::for_side(Side::One)),
            Team::new(two, TeamColor::for_side(Side::Two)),
        ];
        let mut game = Game::new(new.host_id, new.game_type, teams, now);
        game.venue_id = new.venue_id;
        game.tournament = new.tournament;
        let game = self.games.save(game)?;
        log::info!(
            "Game {} started ({} players, target {}{})",
            game.id,
            game.player_count(),
            game.target(),
            if game.is_guest_game { ", guest game" } else { "" }
        );
        Ok(game)
    }

    pub fn get(&self, id: GameId) -> Result<Game, CoreError> {
        self.games.load(id)
    }

    pub fn subscribe(&self, id: GameId) -> Result<watch::Receiver<Game>, CoreError> {
        self.games.subscribe(id)
    }

    /// Per-player tallies and highlights of a game, live or finished.
    pub fn summary(&self, id: GameId) -> Result<MatchSummary, CoreError> {
        self.games.load(id).map(|game| MatchSummary::from_game(&game))
    }

    /// Load a game, rejecting a client that acted on an outdated version.
    fn load_for_write(&self, id: GameId, expected_version: Option<u64>) -> Result<Game, CoreError> {
        let game = self.games.load(id)?;
        match expected_version {
            Some(expected) if expected != game.version => Err(CoreError::ConcurrencyHazard {
                expected,
                found: game.version,
            }),
            _ => Ok(game),
        }
    }

    pub fn record_goal(
        &self,
        id: GameId,
        input: &GoalInput,
        expected_version: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<GoalRecorded, CoreError> {
        let game = self.load_for_write(id, expected_version)?;
        let scored = scoring::apply_goal(&game, input, now)?;
        let game = self.games.save(scored.game)?;
        log::debug!(
            "Game {}: {:?} by {} from {:?}, score {}-{}",
            id,
            scored.goal.goal_type,
            scored.goal.scorer_name,
            scored.goal.position,
            game.score[0],
            game.score[1]
        );
        if scored.won {
            self.finalize(&game);
        }
        Ok(GoalRecorded {
            game,
            goal: scored.goal,
            completed: scored.won,
        })
    }

    pub fn undo_last_goal(&self, id: GameId, expected_version: Option<u64>) -> Result<Game, CoreError> {
        let game = self.load_for_write(id, expected_version)?;
        let undone = scoring::undo_last_goal(&game)?;
        if game.goals.is_empty() {
            return Ok(game);
        }
        let game = self.games.save(undone)?;
        log::debug!("Game {}: undo, score {}-{}", id, game.score[0], game.score[1]);
        Ok(game)
    }

    /// End on the current score. Tournament games must have a leader.
    pub fn end_game(&self, id: GameId, now: DateTime<Utc>) -> Result<GameUpdate, CoreError> {
        let game = self.games.load(id)?;
        let ended = scoring::end_game(&game, now)?;
        if ended.tournament.is_some() && ended.winner.is_none() {
            return Err(CoreError::DrawNotAllowed);
        }
        let game = self.games.save(ended)?;
        self.finalize(&game);
        Ok(GameUpdate {
            game,
            completed: true,
        })
    }

    pub fn forfeit(&self, id: GameId, forfeiting: Side, now: DateTime<Utc>) -> Result<GameUpdate, CoreError> {
        let game = self.games.load(id)?;
        let game = self.games.save(scoring::forfeit(&game, forfeiting, now)?)?;
        log::info!("Game {}: side {} forfeited", id, forfeiting.index());
        self.finalize(&game);
        Ok(GameUpdate {
            game,
            completed: true,
        })
    }

    /// Cancel a running game. No stats are recorded for it.
    pub fn abandon(&self, id: GameId, now: DateTime<Utc>) -> Result<Game, CoreError> {
        let game = self.games.load(id)?;
        let game = self.games.save(scoring::abandon(&game, now)?)?;
        log::info!("Game {} abandoned", id);
        Ok(game)
    }

    /// End-of-game side effects.
    fn finalize(&self, game: &Game) {
        log::info!(
            "Game {} completed {}-{} (winner: {:?}, {}s)",
            game.id,
            game.score[0],
            game.score[1],
            game.winner.map(Side::index),
            game.duration_secs.unwrap_or(0)
        );
        if game.is_guest_game {
            log::info!("Game {} includes guests; player stats skipped", game.id);
        } else {
            self.stats
                .on_match_completed(game.id, &game.teams, &game.goals, game.winner);
        }
        if let Some(venue_id) = &game.venue_id {
            self.venues.on_match_completed(venue_id, game.player_count());
        }
    }
}

