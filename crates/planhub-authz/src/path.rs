//! Hierarchy path resolution — builds the full ancestor chain from a
//! target entity up to its owning workspace.
//!
//! Resolution issues one batched store lookup per layer transition, not
//! one per ancestor, so checking a page of tasks costs the same number
//! of round trips as checking one. Containment is a DAG of fixed depth;
//! any chain longer than [`MAX_PATH_DEPTH`] hops or revisiting a node is
//! a fatal integrity fault, never silently tolerated.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;
use uuid::Uuid;

use planhub_cache::{AuthzCache, keys};
use planhub_core::error::AppError;
use planhub_core::result::AppResult;
use planhub_entity::hierarchy::{HierarchyNode, HierarchyPath, HierarchyRecord};
use planhub_entity::layer::{EntityLayer, MAX_PATH_DEPTH};

use crate::store::HierarchyStore;

/// Paths resolved by a batch call, keyed by target id.
///
/// Targets absent from the map do not exist (or have a dangling
/// ancestor); the caller decides whether that is fatal.
#[derive(Debug, Default)]
pub struct ResolvedPaths {
    /// Successfully resolved paths.
    pub paths: HashMap<Uuid, HierarchyPath>,
}

/// Resolves ancestor chains through the hierarchy store, fronted by the
/// permission cache.
#[derive(Clone)]
pub struct PathResolver {
    hierarchy: Arc<dyn HierarchyStore>,
    cache: Arc<AuthzCache>,
    path_ttl: Duration,
}

impl std::fmt::Debug for PathResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathResolver").finish()
    }
}

impl PathResolver {
    /// Create a new path resolver.
    pub fn new(
        hierarchy: Arc<dyn HierarchyStore>,
        cache: Arc<AuthzCache>,
        path_ttl: Duration,
    ) -> Self {
        Self {
            hierarchy,
            cache,
            path_ttl,
        }
    }

    /// Resolve the hierarchy path for a single target.
    ///
    /// Fails with `NotFound` if the target or any node in its chain is
    /// missing (dangling reference).
    pub async fn resolve(&self, entity_id: Uuid, layer: EntityLayer) -> AppResult<HierarchyPath> {
        let mut resolved = self.resolve_many(layer, &[entity_id]).await?;
        resolved.paths.remove(&entity_id).ok_or_else(|| {
            AppError::not_found(format!(
                "{layer} {entity_id} not found or its ancestor chain is broken"
            ))
        })
    }

    /// Resolve hierarchy paths for many targets of the same layer.
    ///
    /// Cached paths are reused; the remainder is resolved with one
    /// batched store lookup per layer transition and cached afterwards.
    pub async fn resolve_many(
        &self,
        layer: EntityLayer,
        ids: &[Uuid],
    ) -> AppResult<ResolvedPaths> {
        let mut resolved = ResolvedPaths::default();
        let mut to_resolve: Vec<Uuid> = Vec::new();
        let mut requested: HashSet<Uuid> = HashSet::new();

        for &id in ids {
            if !requested.insert(id) {
                continue;
            }
            let key = keys::path_key(layer.as_str(), id);
            match self.cache.get::<HierarchyPath>(&key).await? {
                Some(path) => {
                    resolved.paths.insert(id, path);
                }
                None => to_resolve.push(id),
            }
        }

        if to_resolve.is_empty() {
            return Ok(resolved);
        }

        let nodes = self.fetch_closure(layer, &to_resolve).await?;

        for target_id in to_resolve {
            if let Some(path) = assemble_path(target_id, &nodes)? {
                self.cache_path(&path).await?;
                resolved.paths.insert(target_id, path);
            }
        }

        Ok(resolved)
    }

    /// Fetch the transitive parent closure of the given targets,
    /// level by level, one batched lookup per layer encountered.
    async fn fetch_closure(
        &self,
        layer: EntityLayer,
        ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, HierarchyRecord>> {
        let mut nodes: HashMap<Uuid, HierarchyRecord> = HashMap::new();
        let mut frontier: HashMap<EntityLayer, HashSet<Uuid>> = HashMap::new();
        frontier.insert(layer, ids.iter().copied().collect());

        let mut depth = 0usize;
        while !frontier.is_empty() {
            if depth > MAX_PATH_DEPTH {
                return Err(AppError::integrity(format!(
                    "Hierarchy walk exceeded the maximum depth of {MAX_PATH_DEPTH}"
                )));
            }

            let mut next: HashMap<EntityLayer, HashSet<Uuid>> = HashMap::new();
            for (level_layer, level_ids) in frontier {
                let wanted: Vec<Uuid> = level_ids
                    .into_iter()
                    .filter(|id| !nodes.contains_key(id))
                    .collect();
                if wanted.is_empty() {
                    continue;
                }

                let fetched = self.hierarchy.get_nodes(level_layer, &wanted).await?;
                for (id, record) in fetched {
                    match (record.parent_id, record.parent_layer) {
                        (Some(parent_id), Some(parent_layer)) => {
                            if !record.layer.allowed_parent_layers().contains(&parent_layer) {
                                return Err(AppError::integrity(format!(
                                    "{} {} names a {} as its parent",
                                    record.layer, record.id, parent_layer
                                )));
                            }
                            if !nodes.contains_key(&parent_id) {
                                next.entry(parent_layer).or_default().insert(parent_id);
                            }
                        }
                        (None, None) if record.layer.is_root() => {}
                        _ => {
                            return Err(AppError::integrity(format!(
                                "{} {} has an inconsistent parent link",
                                record.layer, record.id
                            )));
                        }
                    }
                    nodes.insert(id, record);
                }
            }

            frontier = next;
            depth += 1;
        }

        Ok(nodes)
    }

    async fn cache_path(&self, path: &HierarchyPath) -> AppResult<()> {
        let key = keys::path_key(path.target_layer.as_str(), path.target_id);
        let mut tags = Vec::with_capacity(2 + path.ancestors.len());
        tags.push(keys::workspace_tag(path.workspace_id));
        tags.push(keys::entity_tag(path.target_layer.as_str(), path.target_id));
        for node in &path.ancestors {
            tags.push(keys::entity_tag(node.layer.as_str(), node.id));
        }
        self.cache.insert(&key, path, self.path_ttl, &tags).await
    }
}

/// Assemble one target's path from the fetched node closure.
///
/// Returns `Ok(None)` when the target or one of its ancestors is missing
/// from the store; structural faults (cycle, depth overflow, non-root
/// without a parent) are integrity errors.
fn assemble_path(
    target_id: Uuid,
    nodes: &HashMap<Uuid, HierarchyRecord>,
) -> AppResult<Option<HierarchyPath>> {
    let Some(target) = nodes.get(&target_id) else {
        return Ok(None);
    };

    let mut ancestors: Vec<HierarchyNode> = Vec::new();
    let mut seen: HashSet<Uuid> = HashSet::from([target_id]);
    let mut current = target;
    let mut hops = 0usize;

    while let Some(parent_id) = current.parent_id {
        hops += 1;
        if hops > MAX_PATH_DEPTH {
            return Err(AppError::integrity(format!(
                "Ancestor chain of {} {} exceeds {MAX_PATH_DEPTH} hops",
                target.layer, target_id
            )));
        }
        if !seen.insert(parent_id) {
            return Err(AppError::integrity(format!(
                "Cycle detected in the ancestor chain of {} {}",
                target.layer, target_id
            )));
        }
        let Some(parent) = nodes.get(&parent_id) else {
            warn!(
                target = %target_id,
                parent = %parent_id,
                "Dangling parent reference in hierarchy"
            );
            return Ok(None);
        };
        ancestors.push(HierarchyNode::from_record(parent));
        current = parent;
    }

    if !current.layer.is_root() {
        return Err(AppError::integrity(format!(
            "Ancestor chain of {} {} terminates at a {} instead of a workspace",
            target.layer, target_id, current.layer
        )));
    }

    Ok(Some(HierarchyPath {
        target_id,
        target_layer: target.layer,
        target_is_private: target.is_private,
        target_creator_id: target.creator_id,
        target_is_archived: target.is_archived,
        workspace_id: current.id,
        workspace_creator_id: current.creator_id,
        ancestors,
    }))
}
