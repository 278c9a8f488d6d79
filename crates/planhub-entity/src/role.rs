//! Workspace role and membership models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Workspace-wide role attached to a membership record.
///
/// Roles are ordered by privilege level: Owner > Admin > Member > Guest > None.
/// `None` is the role of a user with no membership in the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "workspace_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceRole {
    /// Full control over the workspace.
    Owner,
    /// Administrative access short of role management.
    Admin,
    /// Standard content actions.
    Member,
    /// Read-only access.
    Guest,
    /// No membership.
    None,
}

impl WorkspaceRole {
    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::Owner => 4,
            Self::Admin => 3,
            Self::Member => 2,
            Self::Guest => 1,
            Self::None => 0,
        }
    }

    /// Check if this role has at least the given role's privileges.
    pub fn has_at_least(&self, other: &WorkspaceRole) -> bool {
        self.privilege_level() >= other.privilege_level()
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
            Self::Guest => "guest",
            Self::None => "none",
        }
    }
}

impl fmt::Display for WorkspaceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WorkspaceRole {
    type Err = planhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            "guest" => Ok(Self::Guest),
            "none" => Ok(Self::None),
            _ => Err(planhub_core::AppError::validation(format!(
                "Invalid workspace role: '{s}'"
            ))),
        }
    }
}

/// Status of a workspace membership.
///
/// A suspended membership yields no permissions regardless of role or
/// explicit grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    /// Membership in good standing.
    Active,
    /// Membership suspended by an administrator.
    Suspended,
}

/// A (user, workspace) membership record.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Membership {
    /// The member's user ID.
    pub user_id: Uuid,
    /// The workspace this membership belongs to.
    pub workspace_id: Uuid,
    /// Workspace-wide role.
    pub role: WorkspaceRole,
    /// Membership status.
    pub status: MembershipStatus,
    /// When the membership was created.
    pub created_at: DateTime<Utc>,
}

impl Membership {
    /// Whether the membership currently confers any permissions at all.
    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Active
    }
}
