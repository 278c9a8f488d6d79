//! Batch permission checking — amortizes resolution over many entities
//! for list-view gating.
//!
//! Entities are grouped by layer; each group costs one batched hierarchy
//! fetch per layer transition, the role lookup happens once per
//! workspace, and all grants are fetched in a single union round trip.
//! The per-entity decision reuses the same pure waterfall as the single
//! check.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;
use tracing::warn;
use uuid::Uuid;

use planhub_core::result::AppResult;
use planhub_entity::access::AccessLevel;
use planhub_entity::chat::ChatMemberState;
use planhub_entity::hierarchy::HierarchyPath;
use planhub_entity::layer::EntityLayer;
use planhub_entity::permission::Permission;
use planhub_entity::role::Membership;

use crate::store::GrantStore;
use crate::waterfall::{self, WaterfallResolver};

/// Checks one action across many entities in a handful of round trips.
#[derive(Clone)]
pub struct BatchChecker {
    resolver: WaterfallResolver,
    grants: Arc<dyn GrantStore>,
}

impl std::fmt::Debug for BatchChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchChecker").finish()
    }
}

impl BatchChecker {
    /// Create a new batch checker sharing the resolver's adapters.
    pub fn new(resolver: WaterfallResolver, grants: Arc<dyn GrantStore>) -> Self {
        Self { resolver, grants }
    }

    /// Check whether `user_id` may perform `required` on each entity.
    ///
    /// Every requested id appears in the result. Entities that do not
    /// exist (or have a broken ancestor chain) map to `false`: a batch
    /// gate fails closed per entity instead of failing the whole page.
    pub async fn check_many(
        &self,
        user_id: Uuid,
        entities: &[(Uuid, EntityLayer)],
        required: Permission,
    ) -> AppResult<HashMap<Uuid, bool>> {
        let mut results: HashMap<Uuid, bool> = HashMap::with_capacity(entities.len());
        if entities.is_empty() {
            return Ok(results);
        }

        let mut by_layer: HashMap<EntityLayer, Vec<Uuid>> = HashMap::new();
        for (id, layer) in entities {
            by_layer.entry(*layer).or_default().push(*id);
        }

        // One path resolution per layer group.
        let mut paths: HashMap<Uuid, HierarchyPath> = HashMap::new();
        for (layer, ids) in by_layer {
            let resolved = self.resolver.paths().resolve_many(layer, &ids).await?;
            for id in ids {
                if !resolved.paths.contains_key(&id) {
                    warn!(entity = %id, layer = %layer, "Batch check skipped missing entity");
                    results.insert(id, false);
                }
            }
            paths.extend(resolved.paths);
        }

        // Role lookup once per workspace encountered.
        let workspaces: HashSet<Uuid> = paths.values().map(|p| p.workspace_id).collect();
        let mut memberships: HashMap<Uuid, Option<Membership>> = HashMap::new();
        for workspace_id in workspaces {
            let membership = self.resolver.fetch_membership(user_id, workspace_id).await?;
            memberships.insert(workspace_id, membership);
        }

        // One union grant fetch covering every chain node of every path.
        let mut chain_ids: HashSet<Uuid> = HashSet::new();
        for path in paths.values() {
            chain_ids.extend(path.chain_ids());
        }
        let chain_ids: Vec<Uuid> = chain_ids.into_iter().collect();
        let grants: HashMap<Uuid, AccessLevel> =
            self.grants.get_grants(user_id, &chain_ids).await?;

        // Chat state per distinct room, fetched concurrently.
        let rooms: HashSet<(Uuid, Uuid)> = paths
            .values()
            .filter_map(|p| p.chat_room_id().map(|room| (p.workspace_id, room)))
            .collect();
        let chat_fetches = rooms.iter().map(|&(workspace_id, room_id)| async move {
            let state = self
                .resolver
                .fetch_chat_state(user_id, workspace_id, Some(room_id))
                .await?;
            Ok::<_, planhub_core::AppError>((room_id, state))
        });
        let chat_states: HashMap<Uuid, Option<ChatMemberState>> =
            try_join_all(chat_fetches).await?.into_iter().collect();

        let now = Utc::now();
        for (id, path) in &paths {
            let membership = memberships
                .get(&path.workspace_id)
                .and_then(|m| m.as_ref());
            let chat_state = path
                .chat_room_id()
                .and_then(|room| chat_states.get(&room))
                .and_then(|s| s.as_ref());
            let resolved = waterfall::derive(path, user_id, membership, &grants, chat_state, now);
            results.insert(*id, resolved.allows(required));
        }

        Ok(results)
    }
}
