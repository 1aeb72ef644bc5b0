//! Player identity and the shared `Lineup` capability of teams.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account identifier of a player. Guests get a `guest_` prefixed id.
pub type UserId = String;

/// Prefix marking an ephemeral, non-persisted player identity.
pub const GUEST_PREFIX: &str = "guest_";

/// A player as attached to a game or tournament (snapshot, not edited afterwards).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub user_id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl Player {
    pub fn new(user_id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            avatar_url: None,
        }
    }

    /// Create a guest player with a fresh `guest_` id.
    pub fn guest(username: impl Into<String>) -> Self {
        Self::new(
            format!("{}{}", GUEST_PREFIX, Uuid::new_v4().simple()),
            username,
        )
    }

    pub fn is_guest(&self) -> bool {
        is_guest_id(&self.user_id)
    }
}

/// True for ids minted by [`Player::guest`] (or any id carrying the guest prefix).
pub fn is_guest_id(user_id: &str) -> bool {
    user_id.starts_with(GUEST_PREFIX)
}

/// Anything that fields players as one unit: a game side or a tournament team.
pub trait Lineup {
    fn players(&self) -> &[Player];

    fn size(&self) -> usize {
        self.players().len()
    }

    fn has_guest(&self) -> bool {
        self.players().iter().any(Player::is_guest)
    }

    fn contains(&self, user_id: &str) -> bool {
        self.players().iter().any(|p| p.user_id == user_id)
    }

    fn find_player(&self, user_id: &str) -> Option<&Player> {
        self.players().iter().find(|p| p.user_id == user_id)
    }
}
