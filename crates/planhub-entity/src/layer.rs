//! Entity layer enumeration — where a node sits in the containment tree.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of parent hops from any entity to its workspace.
///
/// The deepest chain is `Task -> List -> Folder -> Space -> Workspace`.
/// The path resolver treats anything longer as a data integrity fault.
pub const MAX_PATH_DEPTH: usize = 4;

/// Containment layer of an entity.
///
/// Containment order: `Task -> List -> (optional Folder) -> Space ->
/// Workspace`, and `ChatMessage -> ChatRoom -> Workspace`. The workspace
/// is the root and is never private.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "entity_layer", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntityLayer {
    /// Root tenant container.
    Workspace,
    /// Top-level content container inside a workspace.
    Space,
    /// Optional grouping level between a space and its lists.
    Folder,
    /// Container of tasks.
    List,
    /// Leaf content entity.
    Task,
    /// Chat room owned directly by a workspace.
    ChatRoom,
    /// Message inside a chat room.
    ChatMessage,
}

impl EntityLayer {
    /// Return the layer as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Workspace => "workspace",
            Self::Space => "space",
            Self::Folder => "folder",
            Self::List => "list",
            Self::Task => "task",
            Self::ChatRoom => "chat_room",
            Self::ChatMessage => "chat_message",
        }
    }

    /// Whether this layer is the hierarchy root.
    pub fn is_root(&self) -> bool {
        matches!(self, Self::Workspace)
    }

    /// Whether this layer belongs to the chat branch of the hierarchy.
    pub fn is_chat(&self) -> bool {
        matches!(self, Self::ChatRoom | Self::ChatMessage)
    }

    /// The layers a node of this layer is allowed to name as its parent.
    ///
    /// Used by the path resolver to reject corrupt parent links. A list's
    /// parent is its folder when one exists, otherwise its space.
    pub fn allowed_parent_layers(&self) -> &'static [EntityLayer] {
        match self {
            Self::Workspace => &[],
            Self::Space => &[Self::Workspace],
            Self::Folder => &[Self::Space],
            Self::List => &[Self::Folder, Self::Space],
            Self::Task => &[Self::List],
            Self::ChatRoom => &[Self::Workspace],
            Self::ChatMessage => &[Self::ChatRoom],
        }
    }
}

impl fmt::Display for EntityLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityLayer {
    type Err = planhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "workspace" => Ok(Self::Workspace),
            "space" => Ok(Self::Space),
            "folder" => Ok(Self::Folder),
            "list" => Ok(Self::List),
            "task" => Ok(Self::Task),
            "chat_room" => Ok(Self::ChatRoom),
            "chat_message" => Ok(Self::ChatMessage),
            _ => Err(planhub_core::AppError::validation(format!(
                "Invalid entity layer: '{s}'"
            ))),
        }
    }
}
