//! Data structures for foosball games and tournaments.

mod error;
mod game;
mod player;
mod tournament;

pub use error::{CoreError, ErrorKind};
pub use game::{
    Game, GameId, GameStatus, GameType, Goal, GoalType, Position, Side, Team, TeamColor,
    TournamentLink,
};
pub use player::{is_guest_id, Lineup, Player, UserId, GUEST_PREFIX};
pub use tournament::{
    BracketRound, TeamId, Tournament, TournamentFormat, TournamentId, TournamentMatch,
    TournamentMatchId, TournamentMatchStatus, TournamentMode, TournamentStanding,
    TournamentStatus, TournamentTeam, MIN_TEAMS, ROUND_ROBIN_MAX_TEAMS,
};
