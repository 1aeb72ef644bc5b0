//! Foosball score tracker: library with models, scoring and tournament logic, and services.

pub mod export;
pub mod logic;
pub mod models;
pub mod service;
pub mod stats;
pub mod store;

pub use logic::{
    advance_bracket, apply_goal, cancel_tournament, complete_tournament_match, create_team,
    dissolve_team, generate_bracket, generate_fixtures, goal_effect, join_tournament,
    leave_tournament, start_team_setup, start_tournament, start_tournament_match, undo_last_goal,
    BracketProgress, GoalEffect, GoalInput, MatchCompletion, MatchSummary, ScoredGoal,
};
pub use models::{
    BracketRound, CoreError, ErrorKind, Game, GameId, GameStatus, GameType, Goal, GoalType, Lineup,
    Player, Position, Side, TeamId, Team, TeamColor, Tournament, TournamentFormat, TournamentId,
    TournamentLink, TournamentMatch, TournamentMatchId, TournamentMatchStatus, TournamentMode,
    TournamentStanding, TournamentStatus, TournamentTeam, UserId,
};
pub use service::{Clubhouse, MatchLifecycle, NewGame, NewTournament, TournamentLifecycle};
pub use stats::{MemoryStats, PlayerStats, StatAggregator, VenueStats};
pub use store::{MemoryStore, Record, Repository};
