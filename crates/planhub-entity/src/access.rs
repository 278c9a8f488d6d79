//! Explicit per-entity access overrides.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::layer::EntityLayer;

/// Access level granted by an explicit override.
///
/// Ordered by privilege: Manager > Editor > Viewer. Overrides are
/// independent per entity layer: a grant on a list does not create a grant
/// record on its parent space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "access_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Read-only access.
    Viewer,
    /// Create/edit/comment/upload, delete only as the entity's creator.
    Editor,
    /// Full content control including delete.
    Manager,
}

impl AccessLevel {
    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::Manager => 3,
            Self::Editor => 2,
            Self::Viewer => 1,
        }
    }

    /// Check if this level grants at least the given level.
    pub fn has_at_least(&self, required: &AccessLevel) -> bool {
        self.privilege_level() >= required.privilege_level()
    }

    /// Return the level as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Editor => "editor",
            Self::Manager => "manager",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = planhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "viewer" => Ok(Self::Viewer),
            "editor" => Ok(Self::Editor),
            "manager" => Ok(Self::Manager),
            _ => Err(planhub_core::AppError::validation(format!(
                "Invalid access level: '{s}'"
            ))),
        }
    }
}

/// An explicit access grant for a user on a single entity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccessGrant {
    /// Unique grant identifier.
    pub id: Uuid,
    /// The entity this grant applies to.
    pub entity_id: Uuid,
    /// Layer of the entity.
    pub entity_layer: EntityLayer,
    /// User the grant is for.
    pub user_id: Uuid,
    /// Granted access level.
    pub level: AccessLevel,
    /// Admin who created the grant.
    pub granted_by: Uuid,
    /// When this grant expires (None = never).
    pub expires_at: Option<DateTime<Utc>>,
    /// When this grant was created.
    pub created_at: DateTime<Utc>,
}

impl AccessGrant {
    /// Check if this grant has expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|exp| exp <= Utc::now()).unwrap_or(false)
    }
}
