//! Game (a single foosball match), its two sides, and the goal log.

use crate::models::player::{Lineup, Player, UserId};
use crate::models::tournament::{TournamentId, TournamentMatchId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a game.
pub type GameId = Uuid;

/// Index of a side in `Game::teams`. Serialized as `0` / `1`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Side {
    #[default]
    One,
    Two,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::One, Side::Two];

    pub fn index(self) -> usize {
        match self {
            Side::One => 0,
            Side::Two => 1,
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::One => Side::Two,
            Side::Two => Side::One,
        }
    }
}

impl From<Side> for u8 {
    fn from(side: Side) -> u8 {
        side.index() as u8
    }
}

impl TryFrom<u8> for Side {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Side::One),
            1 => Ok(Side::Two),
            other => Err(format!("team index must be 0 or 1, got {}", other)),
        }
    }
}

/// Target score variant. Serialized as `"6"` / `"11"`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum GameType {
    #[default]
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "11")]
    Eleven,
}

impl GameType {
    pub fn target(self) -> i32 {
        match self {
            GameType::Six => 6,
            GameType::Eleven => 11,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamColor {
    #[default]
    Red,
    Blue,
}

impl TeamColor {
    pub fn for_side(side: Side) -> Self {
        match side {
            Side::One => TeamColor::Red,
            Side::Two => TeamColor::Blue,
        }
    }
}

/// One side of a game. `score` is the only field that changes during play.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub players: Vec<Player>,
    pub score: i32,
    pub color: TeamColor,
}

impl Team {
    pub fn new(players: Vec<Player>, color: TeamColor) -> Self {
        Self {
            players,
            score: 0,
            color,
        }
    }
}

impl Lineup for Team {
    fn players(&self) -> &[Player] {
        &self.players
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    #[default]
    Normal,
    /// Ball bounces back out of the goal: penalizes the opponent.
    Gamelle,
    /// Gamelle that ends up in the goal anyway.
    GamelleRentrante,
}

impl GoalType {
    pub fn is_gamelle(self) -> bool {
        matches!(self, GoalType::Gamelle | GoalType::GamelleRentrante)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GoalType::Normal => "normal",
            GoalType::Gamelle => "gamelle",
            GoalType::GamelleRentrante => "gamelle_rentrante",
        }
    }
}

/// Rod the goal was scored from.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Goalkeeper,
    Defense,
    Midfield,
    #[default]
    Attack,
}

impl Position {
    pub fn as_str(self) -> &'static str {
        match self {
            Position::Goalkeeper => "goalkeeper",
            Position::Defense => "defense",
            Position::Midfield => "midfield",
            Position::Attack => "attack",
        }
    }
}

/// An entry in the append-only goal log of a game.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    pub position: Position,
    pub scored_by: UserId,
    /// Username at the time of the goal.
    pub scorer_name: String,
    #[serde(rename = "team_index")]
    pub side: Side,
    /// Effect on the scoring side's score (may be 0).
    pub points: i32,
    /// Multiplier before this goal was applied; restored on undo.
    #[serde(default = "default_multiplier")]
    pub previous_multiplier: u32,
}

fn default_multiplier() -> u32 {
    1
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    #[default]
    InProgress,
    Completed,
    /// Cancelled by the host. Kept, but excluded from every statistic.
    Abandoned,
}

/// Back-reference from a game to the tournament match it was played for.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TournamentLink {
    pub tournament_id: TournamentId,
    pub match_id: TournamentMatchId,
}

/// A single game between two sides.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub venue_id: Option<String>,
    pub game_type: GameType,
    pub teams: [Team; 2],
    /// Mirror of `teams[i].score`.
    pub score: [i32; 2],
    pub goals: Vec<Goal>,
    /// Value of the next non-midfield normal goal.
    pub multiplier: u32,
    pub status: GameStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_secs: Option<i64>,
    /// None while playing, or when the game ended in a draw.
    pub winner: Option<Side>,
    pub host_id: UserId,
    pub is_guest_game: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament: Option<TournamentLink>,
    /// Bumped by the store on every save.
    #[serde(default)]
    pub version: u64,
}

impl Game {
    /// Start a new game, in progress from `started_at`.
    pub fn new(
        host_id: impl Into<UserId>,
        game_type: GameType,
        teams: [Team; 2],
        started_at: DateTime<Utc>,
    ) -> Self {
        let is_guest_game = teams.iter().any(Lineup::has_guest);
        let score = [teams[0].score, teams[1].score];
        Self {
            id: Uuid::new_v4(),
            venue_id: None,
            game_type,
            teams,
            score,
            goals: Vec::new(),
            multiplier: 1,
            status: GameStatus::InProgress,
            started_at,
            ended_at: None,
            duration_secs: None,
            winner: None,
            host_id: host_id.into(),
            is_guest_game,
            tournament: None,
            version: 0,
        }
    }

    pub fn target(&self) -> i32 {
        self.game_type.target()
    }

    pub fn team(&self, side: Side) -> &Team {
        &self.teams[side.index()]
    }

    pub fn score_of(&self, side: Side) -> i32 {
        self.teams[side.index()].score
    }

    /// Set a side's score, keeping the `score` mirror in sync.
    pub fn set_score(&mut self, side: Side, score: i32) {
        self.teams[side.index()].score = score;
        self.score[side.index()] = score;
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == GameStatus::InProgress
    }

    pub fn player_count(&self) -> usize {
        self.teams.iter().map(Lineup::size).sum()
    }

    pub fn all_players(&self) -> impl Iterator<Item = &Player> {
        self.teams.iter().flat_map(|t| t.players.iter())
    }
}
