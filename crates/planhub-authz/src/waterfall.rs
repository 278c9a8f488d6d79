//! The waterfall resolver — combines hierarchy path, grants, role, and
//! creator/suspension/ban state into one [`PermissionContext`] and an
//! effective permission mask.
//!
//! The walk over the chain ("private-first waterfall"):
//! - the nearest explicit grant wins and is read before the privacy test
//!   at every node, the target included;
//! - a private node with no grant at or above it blocks role-derived
//!   inheritance and terminates the walk;
//! - a grant found anywhere in the chain always grants access to the
//!   target, regardless of privacy farther up — privacy only blocks
//!   default inheritance, never an explicit grant.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use planhub_cache::{AuthzCache, keys};
use planhub_core::result::AppResult;
use planhub_entity::access::AccessLevel;
use planhub_entity::chat::ChatMemberState;
use planhub_entity::context::PermissionContext;
use planhub_entity::hierarchy::HierarchyPath;
use planhub_entity::layer::EntityLayer;
use planhub_entity::permission::Permission;
use planhub_entity::role::{Membership, WorkspaceRole};

use crate::matrix;
use crate::path::PathResolver;
use crate::store::{ChatStore, GrantStore, MembershipStore};

/// Outcome of a resolution: the immutable context snapshot plus the
/// permission mask derived from it.
#[derive(Debug, Clone)]
pub struct ResolvedPermission {
    /// The resolved per-check snapshot.
    pub context: PermissionContext,
    /// The effective permission mask.
    pub effective: Permission,
}

impl ResolvedPermission {
    /// Whether the mask allows every action in `required`.
    pub fn allows(&self, required: Permission) -> bool {
        self.effective.allows(required)
    }
}

/// TTLs for the cache entries the resolver populates.
#[derive(Debug, Clone, Copy)]
pub struct ResolverTtls {
    /// TTL for cached role lookups.
    pub role: Duration,
    /// TTL for cached grant chains.
    pub grant: Duration,
    /// TTL for cached chat state.
    pub chat: Duration,
}

/// The core resolver: orchestrates path, role, grant, and chat fetches,
/// then derives the decision through the pure waterfall.
#[derive(Clone)]
pub struct WaterfallResolver {
    paths: PathResolver,
    memberships: Arc<dyn MembershipStore>,
    grants: Arc<dyn GrantStore>,
    chat: Arc<dyn ChatStore>,
    cache: Arc<AuthzCache>,
    ttls: ResolverTtls,
}

impl std::fmt::Debug for WaterfallResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaterfallResolver").finish()
    }
}

impl WaterfallResolver {
    /// Create a new waterfall resolver.
    pub fn new(
        paths: PathResolver,
        memberships: Arc<dyn MembershipStore>,
        grants: Arc<dyn GrantStore>,
        chat: Arc<dyn ChatStore>,
        cache: Arc<AuthzCache>,
        ttls: ResolverTtls,
    ) -> Self {
        Self {
            paths,
            memberships,
            grants,
            chat,
            cache,
            ttls,
        }
    }

    /// Access to the underlying path resolver (shared with the batch
    /// checker).
    pub fn paths(&self) -> &PathResolver {
        &self.paths
    }

    /// Resolve the permission context and effective mask for one user on
    /// one target entity.
    pub async fn resolve(
        &self,
        user_id: Uuid,
        entity_id: Uuid,
        layer: EntityLayer,
    ) -> AppResult<ResolvedPermission> {
        // The path must come first: the role and grant batch keys depend
        // on the ancestor id set. The remaining fetches are independent.
        let path = self.paths.resolve(entity_id, layer).await?;

        let (membership, grants, chat_state) = tokio::try_join!(
            self.fetch_membership(user_id, path.workspace_id),
            self.fetch_grant_chain(user_id, &path),
            self.fetch_chat_state(user_id, path.workspace_id, path.chat_room_id()),
        )?;

        let resolved = derive(
            &path,
            user_id,
            membership.as_ref(),
            &grants,
            chat_state.as_ref(),
            Utc::now(),
        );
        debug!(
            user = %user_id,
            entity = %entity_id,
            layer = %layer,
            effective = ?resolved.effective,
            "Permission resolved"
        );
        Ok(resolved)
    }

    /// Fetch the user's workspace membership through the cache.
    pub(crate) async fn fetch_membership(
        &self,
        user_id: Uuid,
        workspace_id: Uuid,
    ) -> AppResult<Option<Membership>> {
        let key = keys::role_key(user_id, workspace_id);
        let tags = vec![keys::user_tag(user_id), keys::workspace_tag(workspace_id)];
        self.cache
            .get_or_create(&key, self.ttls.role, &tags, || {
                self.memberships.get_membership(user_id, workspace_id)
            })
            .await
    }

    /// Fetch the user's grants for every node in the path, through the
    /// cache, in one store round trip on miss.
    async fn fetch_grant_chain(
        &self,
        user_id: Uuid,
        path: &HierarchyPath,
    ) -> AppResult<HashMap<Uuid, AccessLevel>> {
        let key = keys::grants_key(user_id, path.target_layer.as_str(), path.target_id);
        let mut tags = vec![
            keys::user_tag(user_id),
            keys::workspace_tag(path.workspace_id),
            keys::entity_tag(path.target_layer.as_str(), path.target_id),
        ];
        for node in &path.ancestors {
            tags.push(keys::entity_tag(node.layer.as_str(), node.id));
        }

        let chain = path.chain_ids();
        self.cache
            .get_or_create(&key, self.ttls.grant, &tags, || {
                self.grants.get_grants(user_id, &chain)
            })
            .await
    }

    /// Fetch the user's chat state for chat-layer targets, through the
    /// cache. Non-chat targets resolve to `None` without I/O.
    pub(crate) async fn fetch_chat_state(
        &self,
        user_id: Uuid,
        workspace_id: Uuid,
        chat_room_id: Option<Uuid>,
    ) -> AppResult<Option<ChatMemberState>> {
        let Some(room_id) = chat_room_id else {
            return Ok(None);
        };
        let key = keys::chat_state_key(user_id, room_id);
        let tags = vec![
            keys::user_tag(user_id),
            keys::workspace_tag(workspace_id),
            keys::entity_tag(EntityLayer::ChatRoom.as_str(), room_id),
        ];
        self.cache
            .get_or_create(&key, self.ttls.chat, &tags, || {
                self.chat.get_chat_state(user_id, room_id)
            })
            .await
    }
}

/// The pure waterfall derivation. No I/O; shared by the single-check
/// resolver and the batch checker.
pub(crate) fn derive(
    path: &HierarchyPath,
    user_id: Uuid,
    membership: Option<&Membership>,
    grants: &HashMap<Uuid, AccessLevel>,
    chat_state: Option<&ChatMemberState>,
    now: DateTime<Utc>,
) -> ResolvedPermission {
    let workspace_role = membership
        .map(|m| m.role)
        .unwrap_or(WorkspaceRole::None);
    let is_membership_active = membership.map(|m| m.is_active()).unwrap_or(false);
    let is_creator = path.target_creator_id == user_id;
    let is_workspace_creator = path.workspace_creator_id == user_id;

    // Walk: adopt the nearest grant; a private node with no grant at or
    // above it blocks and terminates.
    let mut effective_access_level = grants.get(&path.target_id).copied();
    let mut is_privacy_blocked = false;

    if path.target_is_private
        && !path.target_layer.is_root()
        && effective_access_level.is_none()
    {
        is_privacy_blocked = true;
    }

    if !is_privacy_blocked {
        for ancestor in &path.ancestors {
            if effective_access_level.is_none() {
                effective_access_level = grants.get(&ancestor.id).copied();
            }
            if ancestor.is_private && effective_access_level.is_none() {
                is_privacy_blocked = true;
                break;
            }
        }
    }

    let is_banned = chat_state.map(|s| s.is_banned).unwrap_or(false);
    let is_muted = chat_state.map(|s| s.is_muted(now)).unwrap_or(false);

    let context = PermissionContext {
        user_id,
        workspace_id: path.workspace_id,
        entity_id: path.target_id,
        entity_layer: path.target_layer,
        workspace_role,
        is_membership_active,
        effective_access_level,
        is_privacy_blocked,
        is_creator,
        is_workspace_creator,
        is_entity_archived: path.target_is_archived,
        chat_room_role: chat_state.map(|s| s.role),
        is_banned_from_chat_room: is_banned,
        is_muted_in_chat_room: is_muted,
    };

    let effective = effective_mask(&context);
    ResolvedPermission { context, effective }
}

/// Derive the effective mask from a resolved context.
///
/// Denial ordering: suspension (or no membership) beats everything,
/// including the workspace-creator bypass; an explicit grant beats a
/// privacy block; a privacy block beats the role fallback.
fn effective_mask(ctx: &PermissionContext) -> Permission {
    if !ctx.is_membership_active {
        return Permission::empty();
    }

    let base = if ctx.is_workspace_creator {
        Permission::all()
    } else if let Some(level) = ctx.effective_access_level {
        matrix::access_permissions(level, ctx.is_creator)
    } else if ctx.is_privacy_blocked {
        Permission::empty()
    } else {
        matrix::role_permissions(ctx.workspace_role)
    };

    if !ctx.entity_layer.is_chat() {
        return base;
    }

    let mut mask = base;
    if ctx.is_banned_from_chat_room {
        mask -= Permission::WRITE;
    } else if ctx.is_muted_in_chat_room {
        mask -= Permission::CREATE | Permission::COMMENT;
    }
    mask
}
