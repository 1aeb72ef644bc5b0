//! Game and tournament business logic: scoring, scheduling, bracket, tournament flow.

pub mod bracket;
pub mod round_robin;
pub mod scoring;
pub mod summary;
pub mod tournament;

pub use bracket::{advance_bracket, generate_bracket, BracketProgress};
pub use round_robin::generate_fixtures;
pub use scoring::{apply_goal, goal_effect, undo_last_goal, GoalEffect, GoalInput, ScoredGoal};
pub use summary::MatchSummary;
pub use tournament::{
    cancel_tournament, complete_tournament_match, create_team, dissolve_team, join_tournament,
    leave_tournament, start_team_setup, start_tournament, start_tournament_match, MatchCompletion,
};
