//! Cache key and tag builders for all PlanHub authorization cache entries.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the engine uses.

use uuid::Uuid;

/// Prefix applied to all PlanHub cache keys.
const PREFIX: &str = "planhub";

// ── Keys ───────────────────────────────────────────────────

/// Cache key for a user's workspace role lookup.
pub fn role_key(user_id: Uuid, workspace_id: Uuid) -> String {
    format!("{PREFIX}:authz:role:{user_id}:{workspace_id}")
}

/// Cache key for the hierarchy path of an entity.
pub fn path_key(layer: &str, entity_id: Uuid) -> String {
    format!("{PREFIX}:authz:path:{layer}:{entity_id}")
}

/// Cache key for the access-grant chain of a user on a target entity.
pub fn grants_key(user_id: Uuid, layer: &str, entity_id: Uuid) -> String {
    format!("{PREFIX}:authz:grants:{user_id}:{layer}:{entity_id}")
}

/// Cache key for a user's chat membership state in a room.
pub fn chat_state_key(user_id: Uuid, chat_room_id: Uuid) -> String {
    format!("{PREFIX}:authz:chat:{user_id}:{chat_room_id}")
}

// ── Tags ───────────────────────────────────────────────────

/// Tag covering every cached decision for one user.
pub fn user_tag(user_id: Uuid) -> String {
    format!("user-permissions:{user_id}")
}

/// Tag covering every cached decision for members of one workspace.
pub fn workspace_tag(workspace_id: Uuid) -> String {
    format!("workspace-members:{workspace_id}")
}

/// Tag covering every cached chain that includes one entity.
pub fn entity_tag(layer: &str, entity_id: Uuid) -> String {
    format!("entity-grants:{layer}:{entity_id}")
}
