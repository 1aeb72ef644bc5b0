//! Error type shared by the scoring engine, tournament engines and services.

use crate::models::game::GameId;
use crate::models::player::UserId;
use crate::models::tournament::{TeamId, TournamentId, TournamentMatchId};

/// Broad class of a [`CoreError`], used by callers to pick a response.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    Validation,
    ConcurrencyHazard,
}

/// Errors that can occur during game or tournament operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CoreError {
    GameNotFound(GameId),
    TournamentNotFound(TournamentId),
    TeamNotFound(TeamId),
    MatchNotFound(TournamentMatchId),
    PlayerNotFound(UserId),
    /// Game or tournament is not in a state that allows this action.
    InvalidState(&'static str),
    /// Tournament is past its `expires_at`.
    TournamentExpired,
    /// A game side must field 1 or 2 players, and both sides the same number.
    InvalidLineup,
    /// A player appears twice (in a game, a tournament, or across teams).
    DuplicatePlayer(UserId),
    /// The scorer does not play for the side the goal was credited to.
    ScorerNotOnSide(UserId),
    NotEnoughPlayers { required: usize, found: usize },
    NotEnoughTeams { required: usize, found: usize },
    TooManyTeams { max: usize, found: usize },
    WrongTeamSize { expected: usize, found: usize },
    EmptyName,
    /// Tournament games must produce a winner.
    DrawNotAllowed,
    /// The stored record changed since it was read.
    ConcurrencyHazard { expected: u64, found: u64 },
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        use CoreError::*;
        match self {
            GameNotFound(_) | TournamentNotFound(_) | TeamNotFound(_) | MatchNotFound(_)
            | PlayerNotFound(_) => ErrorKind::NotFound,
            InvalidState(_) | TournamentExpired => ErrorKind::InvalidState,
            InvalidLineup
            | DuplicatePlayer(_)
            | ScorerNotOnSide(_)
            | NotEnoughPlayers { .. }
            | NotEnoughTeams { .. }
            | TooManyTeams { .. }
            | WrongTeamSize { .. }
            | EmptyName
            | DrawNotAllowed => ErrorKind::Validation,
            ConcurrencyHazard { .. } => ErrorKind::ConcurrencyHazard,
        }
    }
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::GameNotFound(id) => write!(f, "Game {} not found", id),
            CoreError::TournamentNotFound(id) => write!(f, "Tournament {} not found", id),
            CoreError::TeamNotFound(id) => write!(f, "Team {} not found", id),
            CoreError::MatchNotFound(id) => write!(f, "Tournament match {} not found", id),
            CoreError::PlayerNotFound(id) => write!(f, "Player {} not found", id),
            CoreError::InvalidState(what) => write!(f, "Invalid state: {}", what),
            CoreError::TournamentExpired => write!(f, "Tournament has expired"),
            CoreError::InvalidLineup => {
                write!(f, "Both teams must have the same number of players (1 or 2)")
            }
            CoreError::DuplicatePlayer(id) => write!(f, "Player {} is already taken", id),
            CoreError::ScorerNotOnSide(id) => {
                write!(f, "Player {} does not play for the scoring team", id)
            }
            CoreError::NotEnoughPlayers { required, found } => {
                write!(f, "Need at least {} players (have {})", required, found)
            }
            CoreError::NotEnoughTeams { required, found } => {
                write!(f, "Need at least {} complete teams (have {})", required, found)
            }
            CoreError::TooManyTeams { max, found } => {
                write!(f, "At most {} teams allowed (have {})", max, found)
            }
            CoreError::WrongTeamSize { expected, found } => {
                write!(f, "Teams need exactly {} players (got {})", expected, found)
            }
            CoreError::EmptyName => write!(f, "Name must not be empty"),
            CoreError::DrawNotAllowed => write!(f, "A tournament game cannot end in a draw"),
            CoreError::ConcurrencyHazard { expected, found } => write!(
                f,
                "Record was modified concurrently (expected version {}, found {})",
                expected, found
            ),
        }
    }
}

impl std::error::Error for CoreError {}
