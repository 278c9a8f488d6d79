//! Store ports the engine consumes.
//!
//! These traits are the engine's view of the surrounding system: the
//! containment hierarchy, workspace memberships, explicit access grants,
//! and chat room membership. `planhub-database` provides the Postgres
//! implementations; the engine's test suite uses in-memory fakes.
//!
//! All operations are pure reads except `GrantStore::grant`/`revoke`,
//! which exist for admin features and must be followed by cache
//! invalidation (see [`crate::grants::GrantService`]).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use planhub_core::result::AppResult;
use planhub_entity::access::{AccessGrant, AccessLevel};
use planhub_entity::chat::ChatMemberState;
use planhub_entity::hierarchy::HierarchyRecord;
use planhub_entity::layer::EntityLayer;
use planhub_entity::role::Membership;

/// Read-only access to the containment hierarchy.
#[async_trait]
pub trait HierarchyStore: Send + Sync + 'static {
    /// Batched lookup of hierarchy records for entities of one layer.
    ///
    /// Ids missing from the returned map do not exist; the caller decides
    /// whether that is a `NotFound` fault or a skip.
    async fn get_nodes(
        &self,
        layer: EntityLayer,
        ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, HierarchyRecord>>;
}

/// Read-only access to workspace membership records.
#[async_trait]
pub trait MembershipStore: Send + Sync + 'static {
    /// Look up a user's membership in a workspace. `None` means the user
    /// is not a member.
    async fn get_membership(
        &self,
        user_id: Uuid,
        workspace_id: Uuid,
    ) -> AppResult<Option<Membership>>;
}

/// Parameters for creating an access grant.
#[derive(Debug, Clone)]
pub struct NewGrant {
    /// Entity the grant applies to.
    pub entity_id: Uuid,
    /// Layer of the entity.
    pub entity_layer: EntityLayer,
    /// User the grant is for.
    pub user_id: Uuid,
    /// Granted access level.
    pub level: AccessLevel,
    /// Admin creating the grant.
    pub granted_by: Uuid,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Access to explicit per-entity grants.
#[async_trait]
pub trait GrantStore: Send + Sync + 'static {
    /// Batch lookup of a user's unexpired grants across a set of entity
    /// ids (a full ancestor chain plus the target), in one round trip.
    async fn get_grants(
        &self,
        user_id: Uuid,
        entity_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, AccessLevel>>;

    /// Create (or replace) a grant.
    async fn grant(&self, grant: NewGrant) -> AppResult<AccessGrant>;

    /// Revoke a user's grant on an entity. Returns `true` if a grant
    /// existed.
    async fn revoke(
        &self,
        entity_id: Uuid,
        entity_layer: EntityLayer,
        user_id: Uuid,
    ) -> AppResult<bool>;
}

/// Read-only access to chat room membership state.
#[async_trait]
pub trait ChatStore: Send + Sync + 'static {
    /// Look up a user's state in a chat room. `None` means the user is
    /// not a room member.
    async fn get_chat_state(
        &self,
        user_id: Uuid,
        chat_room_id: Uuid,
    ) -> AppResult<Option<ChatMemberState>>;
}
