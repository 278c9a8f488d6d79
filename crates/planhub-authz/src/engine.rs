//! The engine facade consumed by application command/query handlers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use uuid::Uuid;

use planhub_cache::{AuthzCache, keys};
use planhub_core::config::authz::AuthzConfig;
use planhub_core::error::AppError;
use planhub_core::result::AppResult;
use planhub_entity::layer::EntityLayer;
use planhub_entity::permission::Permission;

use crate::batch::BatchChecker;
use crate::path::PathResolver;
use crate::store::{ChatStore, GrantStore, HierarchyStore, MembershipStore};
use crate::waterfall::{ResolvedPermission, ResolverTtls, WaterfallResolver};

/// The authorization engine.
///
/// Stateless between calls apart from the cache. Safe to clone and share
/// across concurrent request handlers.
#[derive(Debug, Clone)]
pub struct PermissionEngine {
    resolver: WaterfallResolver,
    batch: BatchChecker,
    cache: Arc<AuthzCache>,
}

impl PermissionEngine {
    /// Wire the engine from its store adapters, cache, and configuration.
    pub fn new(
        hierarchy: Arc<dyn HierarchyStore>,
        memberships: Arc<dyn MembershipStore>,
        grants: Arc<dyn GrantStore>,
        chat: Arc<dyn ChatStore>,
        cache: Arc<AuthzCache>,
        config: &AuthzConfig,
    ) -> Self {
        let paths = PathResolver::new(
            hierarchy,
            Arc::clone(&cache),
            Duration::from_secs(config.path_ttl_seconds),
        );
        let resolver = WaterfallResolver::new(
            paths,
            memberships,
            Arc::clone(&grants),
            chat,
            Arc::clone(&cache),
            ResolverTtls {
                role: Duration::from_secs(config.role_ttl_seconds),
                grant: Duration::from_secs(config.grant_ttl_seconds),
                chat: Duration::from_secs(config.chat_ttl_seconds),
            },
        );
        let batch = BatchChecker::new(resolver.clone(), grants);

        Self {
            resolver,
            batch,
            cache,
        }
    }

    /// Resolve the full permission context and effective mask for a user
    /// on a target entity. Used by callers that gate UI per action.
    pub async fn resolve(
        &self,
        user_id: Uuid,
        entity_id: Uuid,
        layer: EntityLayer,
    ) -> AppResult<ResolvedPermission> {
        self.resolver.resolve(user_id, entity_id, layer).await
    }

    /// Whether the user may perform every action in `required` on the
    /// target entity.
    pub async fn has_permission(
        &self,
        user_id: Uuid,
        entity_id: Uuid,
        layer: EntityLayer,
        required: Permission,
    ) -> AppResult<bool> {
        let resolved = self.resolve(user_id, entity_id, layer).await?;
        Ok(resolved.allows(required))
    }

    /// Resolve and fail with an authorization error if the user lacks
    /// `required`. The error maps to an HTTP 403 equivalent upstream.
    pub async fn ensure_permission(
        &self,
        user_id: Uuid,
        entity_id: Uuid,
        layer: EntityLayer,
        required: Permission,
    ) -> AppResult<ResolvedPermission> {
        let resolved = self.resolve(user_id, entity_id, layer).await?;
        if !resolved.allows(required) {
            return Err(AppError::authorization(
                "You do not have permission to perform this action on this entity",
            ));
        }
        Ok(resolved)
    }

    /// Check one action across many entities. Every requested id appears
    /// in the result; unknown entities map to `false`.
    pub async fn check_batch(
        &self,
        user_id: Uuid,
        entities: &[(Uuid, EntityLayer)],
        required: Permission,
    ) -> AppResult<HashMap<Uuid, bool>> {
        self.batch.check_many(user_id, entities, required).await
    }

    /// Drop every cached decision for a user. Called after the user's
    /// role or membership changed.
    pub async fn invalidate_user(&self, user_id: Uuid) {
        let removed = self.cache.remove_by_tag(&keys::user_tag(user_id)).await;
        info!(user = %user_id, removed, "Invalidated user permission cache");
    }

    /// Drop every cached decision touching a workspace. Called after a
    /// workspace-wide membership or settings change.
    pub async fn invalidate_workspace(&self, workspace_id: Uuid) {
        let removed = self
            .cache
            .remove_by_tag(&keys::workspace_tag(workspace_id))
            .await;
        info!(workspace = %workspace_id, removed, "Invalidated workspace permission cache");
    }

    /// Drop every cached chain that includes an entity. Called after a
    /// grant change, privacy flip, or hierarchy move on that entity.
    pub async fn invalidate_entity(&self, entity_id: Uuid, layer: EntityLayer) {
        let removed = self
            .cache
            .remove_by_tag(&keys::entity_tag(layer.as_str(), entity_id))
            .await;
        info!(entity = %entity_id, layer = %layer, removed, "Invalidated entity permission cache");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planhub_core::config::cache::CacheConfig;
    use planhub_core::error::ErrorKind;
    use planhub_entity::access::AccessLevel;
    use planhub_entity::role::{MembershipStatus, WorkspaceRole};

    use crate::grants::GrantService;
    use crate::store::NewGrant;
    use crate::testutil::FakeStores;

    fn build_engine(stores: &Arc<FakeStores>) -> (PermissionEngine, GrantService) {
        let cache = Arc::new(AuthzCache::new(&CacheConfig::default()));
        let engine = PermissionEngine::new(
            Arc::clone(stores) as Arc<dyn crate::store::HierarchyStore>,
            Arc::clone(stores) as Arc<dyn crate::store::MembershipStore>,
            Arc::clone(stores) as Arc<dyn crate::store::GrantStore>,
            Arc::clone(stores) as Arc<dyn crate::store::ChatStore>,
            Arc::clone(&cache),
            &AuthzConfig::default(),
        );
        let grants = GrantService::new(
            Arc::clone(stores) as Arc<dyn crate::store::GrantStore>,
            cache,
        );
        (engine, grants)
    }

    #[tokio::test]
    async fn test_non_member_denied_even_with_grant() {
        let stores = Arc::new(FakeStores::default());
        let user = Uuid::new_v4();
        let ws = stores.add_workspace(Uuid::new_v4());
        let space = stores.add_space(ws, false);
        let list = stores.add_list(space, None, false);
        let task = stores.add_task(list, Uuid::new_v4());
        stores.add_grant(user, task, AccessLevel::Manager);

        let (engine, _) = build_engine(&stores);
        let allowed = engine
            .has_permission(user, task, EntityLayer::Task, Permission::VIEW)
            .await
            .unwrap();
        assert!(!allowed);
    }

    #[tokio::test]
    async fn test_workspace_creator_full_access_behind_privacy() {
        let stores = Arc::new(FakeStores::default());
        let creator = Uuid::new_v4();
        let ws = stores.add_workspace(creator);
        stores.add_member(creator, ws, WorkspaceRole::Owner);
        let space = stores.add_space(ws, true);
        let list = stores.add_list(space, None, true);
        let task = stores.add_task(list, Uuid::new_v4());

        let (engine, _) = build_engine(&stores);
        let resolved = engine.resolve(creator, task, EntityLayer::Task).await.unwrap();
        assert_eq!(resolved.effective, Permission::all());
    }

    #[tokio::test]
    async fn test_viewer_grant_opens_private_list_read_only() {
        let stores = Arc::new(FakeStores::default());
        let user = Uuid::new_v4();
        let ws = stores.add_workspace(Uuid::new_v4());
        stores.add_member(user, ws, WorkspaceRole::Member);
        let space = stores.add_space(ws, false);
        let list = stores.add_list(space, None, true);
        let task = stores.add_task(list, Uuid::new_v4());
        stores.add_grant(user, list, AccessLevel::Viewer);

        let (engine, _) = build_engine(&stores);

        let on_list = engine.resolve(user, list, EntityLayer::List).await.unwrap();
        assert!(on_list.allows(Permission::VIEW));
        assert!(!on_list.allows(Permission::EDIT));

        let on_task = engine.resolve(user, task, EntityLayer::Task).await.unwrap();
        assert!(on_task.allows(Permission::VIEW));
        assert!(!on_task.allows(Permission::CREATE));
    }

    #[tokio::test]
    async fn test_private_space_hides_nested_task_from_member() {
        let stores = Arc::new(FakeStores::default());
        let user = Uuid::new_v4();
        let ws = stores.add_workspace(Uuid::new_v4());
        stores.add_member(user, ws, WorkspaceRole::Member);
        let space = stores.add_space(ws, true);
        let folder = stores.add_folder(space, false);
        let list = stores.add_list(space, Some(folder), false);
        let task = stores.add_task(list, Uuid::new_v4());

        let (engine, _) = build_engine(&stores);
        let resolved = engine.resolve(user, task, EntityLayer::Task).await.unwrap();
        assert!(resolved.context.is_privacy_blocked);
        assert_eq!(resolved.effective, Permission::empty());
    }

    #[tokio::test]
    async fn test_suspended_member_denied_despite_grant() {
        let stores = Arc::new(FakeStores::default());
        let user = Uuid::new_v4();
        let ws = stores.add_workspace(Uuid::new_v4());
        stores.add_member_with_status(user, ws, WorkspaceRole::Admin, MembershipStatus::Suspended);
        let space = stores.add_space(ws, false);
        let list = stores.add_list(space, None, false);
        stores.add_grant(user, list, AccessLevel::Manager);

        let (engine, _) = build_engine(&stores);
        let resolved = engine.resolve(user, list, EntityLayer::List).await.unwrap();
        assert_eq!(resolved.effective, Permission::empty());
    }

    #[tokio::test]
    async fn test_missing_entity_is_not_found() {
        let stores = Arc::new(FakeStores::default());
        let (engine, _) = build_engine(&stores);

        let err = engine
            .resolve(Uuid::new_v4(), Uuid::new_v4(), EntityLayer::Task)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_ensure_permission_denies_with_authorization_error() {
        let stores = Arc::new(FakeStores::default());
        let user = Uuid::new_v4();
        let ws = stores.add_workspace(Uuid::new_v4());
        stores.add_member(user, ws, WorkspaceRole::Guest);
        let space = stores.add_space(ws, false);

        let (engine, _) = build_engine(&stores);
        let err = engine
            .ensure_permission(user, space, EntityLayer::Space, Permission::EDIT)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);

        // VIEW is within the guest mask.
        engine
            .ensure_permission(user, space, EntityLayer::Space, Permission::VIEW)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_repeat_resolution_hits_cache() {
        let stores = Arc::new(FakeStores::default());
        let user = Uuid::new_v4();
        let ws = stores.add_workspace(Uuid::new_v4());
        stores.add_member(user, ws, WorkspaceRole::Member);
        let space = stores.add_space(ws, false);
        let list = stores.add_list(space, None, false);
        let task = stores.add_task(list, Uuid::new_v4());

        let (engine, _) = build_engine(&stores);
        for _ in 0..3 {
            engine.resolve(user, task, EntityLayer::Task).await.unwrap();
        }

        assert_eq!(stores.membership_fetch_count(), 1);
        assert_eq!(stores.grant_fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_grant_and_revoke_take_effect_immediately() {
        let stores = Arc::new(FakeStores::default());
        let user = Uuid::new_v4();
        let admin = Uuid::new_v4();
        let ws = stores.add_workspace(Uuid::new_v4());
        stores.add_member(user, ws, WorkspaceRole::Member);
        let space = stores.add_space(ws, false);
        let list = stores.add_list(space, None, true);
        let task = stores.add_task(list, Uuid::new_v4());

        let (engine, grants) = build_engine(&stores);

        // Primed cache: the private list blocks.
        let before = engine.resolve(user, task, EntityLayer::Task).await.unwrap();
        assert_eq!(before.effective, Permission::empty());

        grants
            .grant(NewGrant {
                entity_id: list,
                entity_layer: EntityLayer::List,
                user_id: user,
                level: AccessLevel::Editor,
                granted_by: admin,
                expires_at: None,
            })
            .await
            .unwrap();

        let after = engine.resolve(user, task, EntityLayer::Task).await.unwrap();
        assert!(after.allows(Permission::VIEW | Permission::EDIT));

        let existed = grants
            .revoke(list, EntityLayer::List, user)
            .await
            .unwrap();
        assert!(existed);

        let revoked = engine.resolve(user, task, EntityLayer::Task).await.unwrap();
        assert_eq!(revoked.effective, Permission::empty());
    }

    #[tokio::test]
    async fn test_invalidate_entity_drops_cached_chains() {
        let stores = Arc::new(FakeStores::default());
        let user = Uuid::new_v4();
        let ws = stores.add_workspace(Uuid::new_v4());
        stores.add_member(user, ws, WorkspaceRole::Member);
        let space = stores.add_space(ws, false);
        let list = stores.add_list(space, None, true);
        let task = stores.add_task(list, Uuid::new_v4());

        let (engine, _) = build_engine(&stores);
        let before = engine.resolve(user, task, EntityLayer::Task).await.unwrap();
        assert_eq!(before.effective, Permission::empty());

        // Grant written behind the cache's back; the stale decision
        // survives until the entity tag is dropped.
        stores.add_grant(user, list, AccessLevel::Viewer);
        let stale = engine.resolve(user, task, EntityLayer::Task).await.unwrap();
        assert_eq!(stale.effective, Permission::empty());

        engine.invalidate_entity(list, EntityLayer::List).await;
        let fresh = engine.resolve(user, task, EntityLayer::Task).await.unwrap();
        assert!(fresh.allows(Permission::VIEW));
    }

    #[tokio::test]
    async fn test_batch_matches_singleton_and_fails_closed() {
        let stores = Arc::new(FakeStores::default());
        let user = Uuid::new_v4();
        let ws = stores.add_workspace(Uuid::new_v4());
        stores.add_member(user, ws, WorkspaceRole::Member);
        let open_space = stores.add_space(ws, false);
        let secret_space = stores.add_space(ws, true);
        let open_list = stores.add_list(open_space, None, false);
        let secret_list = stores.add_list(secret_space, None, false);
        let open_task = stores.add_task(open_list, Uuid::new_v4());
        let secret_task = stores.add_task(secret_list, Uuid::new_v4());
        stores.add_grant(user, secret_list, AccessLevel::Viewer);
        let missing = Uuid::new_v4();

        let (engine, _) = build_engine(&stores);
        let entities = vec![
            (open_task, EntityLayer::Task),
            (secret_task, EntityLayer::Task),
            (open_list, EntityLayer::List),
            (secret_space, EntityLayer::Space),
            (missing, EntityLayer::Task),
        ];
        let batch = engine
            .check_batch(user, &entities, Permission::VIEW)
            .await
            .unwrap();

        assert_eq!(batch.len(), entities.len());
        assert_eq!(batch[&missing], false);
        for (id, layer) in &entities {
            if *id == missing {
                continue;
            }
            let single = engine
                .has_permission(user, *id, *layer, Permission::VIEW)
                .await
                .unwrap();
            assert_eq!(batch[id], single, "batch and singleton disagree");
        }
    }

    #[tokio::test]
    async fn test_banned_chat_member_reads_only() {
        let stores = Arc::new(FakeStores::default());
        let user = Uuid::new_v4();
        let ws = stores.add_workspace(Uuid::new_v4());
        stores.add_member(user, ws, WorkspaceRole::Member);
        let room = stores.add_chat_room(ws, false);
        let message = stores.add_chat_message(room, Uuid::new_v4());
        stores.set_chat_state(user, room, true, None);

        let (engine, _) = build_engine(&stores);
        let resolved = engine
            .resolve(user, message, EntityLayer::ChatMessage)
            .await
            .unwrap();
        assert_eq!(resolved.effective, Permission::VIEW);
    }
}
