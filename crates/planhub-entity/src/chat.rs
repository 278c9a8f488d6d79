//! Chat room membership state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Role of a member inside a single chat room.
///
/// Room roles are surfaced in the permission context for UI gating only;
/// the effective mask is shaped by ban/mute state, not the room role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "chat_room_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChatRoomRole {
    /// Room creator.
    Owner,
    /// Can moderate messages and members.
    Moderator,
    /// Regular participant.
    Member,
}

impl ChatRoomRole {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Moderator => "moderator",
            Self::Member => "member",
        }
    }
}

impl fmt::Display for ChatRoomRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's membership state in a chat room.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatMemberState {
    /// The chat room.
    pub chat_room_id: Uuid,
    /// The member.
    pub user_id: Uuid,
    /// Role inside the room.
    pub role: ChatRoomRole,
    /// Whether the member is banned from the room.
    pub is_banned: bool,
    /// Mute expiry; None means not muted.
    pub muted_until: Option<DateTime<Utc>>,
}

impl ChatMemberState {
    /// Whether the member is muted at `now`.
    pub fn is_muted(&self, now: DateTime<Utc>) -> bool {
        self.muted_until.map(|until| until > now).unwrap_or(false)
    }
}
