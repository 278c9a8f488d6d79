//! Resolved permission context — the per-check snapshot.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::AccessLevel;
use crate::chat::ChatRoomRole;
use crate::layer::EntityLayer;
use crate::role::WorkspaceRole;

/// The resolved, per-request authorization snapshot.
///
/// Built fresh on every resolution (or deserialized from a cache hit),
/// never mutated after construction, and never persisted. It carries
/// everything the permission matrix needs to derive the effective mask,
/// plus the flags UI callers use for gating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionContext {
    /// The user the check is for.
    pub user_id: Uuid,
    /// The workspace owning the target entity.
    pub workspace_id: Uuid,
    /// The target entity.
    pub entity_id: Uuid,
    /// Layer of the target entity.
    pub entity_layer: EntityLayer,
    /// The user's workspace-wide role (`None` variant if not a member).
    pub workspace_role: WorkspaceRole,
    /// Whether the membership is suspended (or absent).
    pub is_membership_active: bool,
    /// Nearest explicit override found along the chain, if any.
    pub effective_access_level: Option<AccessLevel>,
    /// Whether a private node without a grant blocked default inheritance.
    pub is_privacy_blocked: bool,
    /// Whether the user created the target entity.
    pub is_creator: bool,
    /// Whether the user created the owning workspace.
    pub is_workspace_creator: bool,
    /// Whether the target entity is archived.
    pub is_entity_archived: bool,
    /// Room role, for chat targets.
    pub chat_room_role: Option<ChatRoomRole>,
    /// Whether the user is banned from the relevant chat room.
    pub is_banned_from_chat_room: bool,
    /// Whether the user is muted in the relevant chat room.
    pub is_muted_in_chat_room: bool,
}
