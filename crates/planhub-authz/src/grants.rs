//! Grant management — create and revoke explicit access grants, with the
//! synchronous cache invalidation the mutating caller must observe.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use planhub_cache::{AuthzCache, keys};
use planhub_core::result::AppResult;
use planhub_entity::access::AccessGrant;
use planhub_entity::layer::EntityLayer;

use crate::store::{GrantStore, NewGrant};

/// Writes grants through the store and invalidates affected cache tags
/// before returning, so a caller's immediate follow-up check observes
/// the change.
#[derive(Clone)]
pub struct GrantService {
    grants: Arc<dyn GrantStore>,
    cache: Arc<AuthzCache>,
}

impl std::fmt::Debug for GrantService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrantService").finish()
    }
}

impl GrantService {
    /// Create a new grant service.
    pub fn new(grants: Arc<dyn GrantStore>, cache: Arc<AuthzCache>) -> Self {
        Self { grants, cache }
    }

    /// Create (or replace) a grant.
    pub async fn grant(&self, grant: NewGrant) -> AppResult<AccessGrant> {
        let created = self.grants.grant(grant).await?;

        self.invalidate(created.entity_layer, created.entity_id, created.user_id)
            .await;

        info!(
            grant = %created.id,
            user = %created.user_id,
            entity = %created.entity_id,
            layer = %created.entity_layer,
            level = %created.level,
            granted_by = %created.granted_by,
            "Access grant created"
        );
        Ok(created)
    }

    /// Revoke a user's grant on an entity. Returns `true` if a grant
    /// existed.
    pub async fn revoke(
        &self,
        entity_id: Uuid,
        entity_layer: EntityLayer,
        user_id: Uuid,
    ) -> AppResult<bool> {
        let existed = self.grants.revoke(entity_id, entity_layer, user_id).await?;

        self.invalidate(entity_layer, entity_id, user_id).await;

        info!(
            user = %user_id,
            entity = %entity_id,
            layer = %entity_layer,
            existed,
            "Access grant revoked"
        );
        Ok(existed)
    }

    /// Invalidation is awaited before the mutation returns success:
    /// the entity tag reaches every user's cached chain that includes
    /// the entity, the user tag covers the grantee's other cached state.
    async fn invalidate(&self, layer: EntityLayer, entity_id: Uuid, user_id: Uuid) {
        self.cache
            .remove_by_tag(&keys::entity_tag(layer.as_str(), entity_id))
            .await;
        self.cache.remove_by_tag(&keys::user_tag(user_id)).await;
    }
}
