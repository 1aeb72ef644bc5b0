//! Tournament, its teams, matches, standings and bracket rounds.

use crate::models::game::{GameId, GameType, TeamColor};
use crate::models::player::{Lineup, Player, UserId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Unique identifier for a team inside a tournament.
pub type TeamId = Uuid;

/// Unique identifier for a match inside a tournament.
pub type TournamentMatchId = Uuid;

/// Most teams a round robin accepts.
pub const ROUND_ROBIN_MAX_TEAMS: usize = 8;

/// Fewest complete teams needed to start.
pub const MIN_TEAMS: usize = 2;

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum TournamentFormat {
    #[default]
    #[serde(rename = "1v1")]
    OneVOne,
    #[serde(rename = "2v2")]
    TwoVTwo,
}

impl TournamentFormat {
    pub fn players_per_team(self) -> usize {
        match self {
            TournamentFormat::OneVOne => 1,
            TournamentFormat::TwoVTwo => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentMode {
    #[default]
    RoundRobin,
    Bracket,
}

/// Current phase of the tournament.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Players are joining.
    #[default]
    Waiting,
    /// Teams are being formed (automatic for 1v1).
    TeamSetup,
    /// Fixtures generated; matches being played one at a time.
    InProgress,
    Completed,
    Cancelled,
}

impl TournamentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TournamentStatus::Completed | TournamentStatus::Cancelled)
    }
}

/// Unit of competition. In 1v1 each player is wrapped in a one-player team.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TournamentTeam {
    pub id: TeamId,
    pub name: String,
    pub players: Vec<Player>,
    pub color: TeamColor,
}

impl TournamentTeam {
    pub fn new(name: impl Into<String>, players: Vec<Player>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            players,
            color: TeamColor::default(),
        }
    }
}

impl Lineup for TournamentTeam {
    fn players(&self) -> &[Player] {
        &self.players
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentMatchStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    /// One team advances without playing.
    Bye,
}

/// A fixture between two tournament teams. `None` slots are TBD (or the empty side of a bye).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TournamentMatch {
    pub id: TournamentMatchId,
    pub team1: Option<TournamentTeam>,
    pub team2: Option<TournamentTeam>,
    pub status: TournamentMatchStatus,
    pub winner_id: Option<TeamId>,
    pub score: Option<[i32; 2]>,
    pub round: Option<u32>,
    pub match_number: Option<u32>,
    /// Game played for this match, once started.
    pub game_id: Option<GameId>,
}

impl TournamentMatch {
    pub fn new(team1: Option<TournamentTeam>, team2: Option<TournamentTeam>) -> Self {
        Self {
            id: Uuid::new_v4(),
            team1,
            team2,
            status: TournamentMatchStatus::Pending,
            winner_id: None,
            score: None,
            round: None,
            match_number: None,
            game_id: None,
        }
    }

    /// A match that resolves immediately in favour of its only team.
    pub fn bye(team: TournamentTeam) -> Self {
        let winner_id = Some(team.id);
        Self {
            status: TournamentMatchStatus::Bye,
            winner_id,
            ..Self::new(Some(team), None)
        }
    }

    pub fn team_ids(&self) -> [Option<TeamId>; 2] {
        [
            self.team1.as_ref().map(|t| t.id),
            self.team2.as_ref().map(|t| t.id),
        ]
    }

    /// Both teams known and no result yet.
    pub fn is_ready(&self) -> bool {
        self.status == TournamentMatchStatus::Pending && self.team1.is_some() && self.team2.is_some()
    }

    pub fn is_resolved(&self) -> bool {
        matches!(
            self.status,
            TournamentMatchStatus::Completed | TournamentMatchStatus::Bye
        )
    }
}

/// Round-robin table row.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TournamentStanding {
    pub team_id: TeamId,
    pub played: u32,
    pub wins: u32,
    pub losses: u32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub points: u32,
}

impl TournamentStanding {
    pub fn new(team_id: TeamId) -> Self {
        Self {
            team_id,
            ..Self::default()
        }
    }

    pub fn goal_difference(&self) -> i32 {
        self.goals_for - self.goals_against
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketRound {
    pub round_number: u32,
    pub round_name: String,
    pub matches: Vec<TournamentMatch>,
}

/// Full tournament state: roster, teams, fixtures and results.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub format: TournamentFormat,
    pub mode: TournamentMode,
    pub target: GameType,
    pub players: Vec<Player>,
    pub teams: Vec<TournamentTeam>,
    /// Every fixture in play order. In bracket mode this mirrors `bracket`.
    pub matches: Vec<TournamentMatch>,
    pub standings: Option<Vec<TournamentStanding>>,
    pub bracket: Option<Vec<BracketRound>>,
    pub status: TournamentStatus,
    pub host_id: UserId,
    pub venue_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Winning team once completed.
    pub champion_id: Option<TeamId>,
    #[serde(default)]
    pub version: u64,
}

impl Tournament {
    /// Create a tournament in Waiting state with the host as first player.
    pub fn new(
        name: impl Into<String>,
        host: Player,
        format: TournamentFormat,
        mode: TournamentMode,
        target: GameType,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            format,
            mode,
            target,
            host_id: host.user_id.clone(),
            players: vec![host],
            teams: Vec::new(),
            matches: Vec::new(),
            standings: None,
            bracket: None,
            status: TournamentStatus::Waiting,
            venue_id: None,
            created_at,
            expires_at: created_at + ttl,
            champion_id: None,
            version: 0,
        }
    }

    pub fn players_per_team(&self) -> usize {
        self.format.players_per_team()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn has_player(&self, user_id: &str) -> bool {
        self.players.iter().any(|p| p.user_id == user_id)
    }

    pub fn team(&self, team_id: TeamId) -> Option<&TournamentTeam> {
        self.teams.iter().find(|t| t.id == team_id)
    }

    /// Team holding the given player, if any.
    pub fn team_of(&self, user_id: &str) -> Option<&TournamentTeam> {
        self.teams.iter().find(|t| t.contains(user_id))
    }

    /// Players not yet placed in a team.
    pub fn unassigned_players(&self) -> Vec<&Player> {
        self.players
            .iter()
            .filter(|p| self.team_of(&p.user_id).is_none())
            .collect()
    }

    /// Teams with exactly the format's number of players.
    pub fn complete_teams(&self) -> Vec<&TournamentTeam> {
        let size = self.players_per_team();
        self.teams.iter().filter(|t| t.size() == size).collect()
    }

    pub fn find_match(&self, match_id: TournamentMatchId) -> Option<&TournamentMatch> {
        self.matches.iter().find(|m| m.id == match_id)
    }

    /// Match currently being played, if any.
    pub fn live_match(&self) -> Option<&TournamentMatch> {
        self.matches
            .iter()
            .find(|m| m.status == TournamentMatchStatus::InProgress)
    }

    /// Rebuild the flat `matches` list from the bracket (bracket mode only).
    pub fn sync_matches_from_bracket(&mut self) {
        if let Some(rounds) = &self.bracket {
            self.matches = rounds
                .iter()
                .flat_map(|r| r.matches.iter().cloned())
                .collect();
        }
    }
}
