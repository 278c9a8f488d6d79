//! Hierarchy store implementation — per-layer batched parent lookups.
//!
//! One query per layer, each returning the parent link and privacy flag
//! for a whole batch of ids. The list query folds the optional folder
//! level: a list's parent is its folder when `folder_id` is set,
//! otherwise its space. Tasks never carry their own privacy flag.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

use planhub_authz::HierarchyStore;
use planhub_core::error::{AppError, ErrorKind};
use planhub_core::result::AppResult;
use planhub_entity::hierarchy::HierarchyRecord;
use planhub_entity::layer::EntityLayer;

use crate::connection::DatabasePool;

/// PostgreSQL-backed hierarchy store.
#[derive(Debug, Clone)]
pub struct PgHierarchyStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct WorkspaceRow {
    id: Uuid,
    creator_id: Uuid,
    is_archived: bool,
}

#[derive(FromRow)]
struct ContainerRow {
    id: Uuid,
    parent_id: Uuid,
    is_private: bool,
    creator_id: Uuid,
    is_archived: bool,
}

#[derive(FromRow)]
struct ListRow {
    id: Uuid,
    space_id: Uuid,
    folder_id: Option<Uuid>,
    is_private: bool,
    creator_id: Uuid,
    is_archived: bool,
}

#[derive(FromRow)]
struct LeafRow {
    id: Uuid,
    parent_id: Uuid,
    creator_id: Uuid,
    is_archived: bool,
}

impl PgHierarchyStore {
    /// Create a new hierarchy store over the shared pool.
    pub fn new(db: &DatabasePool) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    async fn fetch_workspaces(&self, ids: &[Uuid]) -> AppResult<Vec<HierarchyRecord>> {
        let rows = sqlx::query_as::<_, WorkspaceRow>(
            "SELECT id, creator_id, is_archived FROM workspaces WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch workspaces", e))?;

        Ok(rows
            .into_iter()
            .map(|row| HierarchyRecord {
                id: row.id,
                layer: EntityLayer::Workspace,
                is_private: false,
                parent_id: None,
                parent_layer: None,
                creator_id: row.creator_id,
                is_archived: row.is_archived,
            })
            .collect())
    }

    async fn fetch_containers(
        &self,
        query: &str,
        layer: EntityLayer,
        parent_layer: EntityLayer,
        ids: &[Uuid],
    ) -> AppResult<Vec<HierarchyRecord>> {
        let rows = sqlx::query_as::<_, ContainerRow>(query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to fetch {layer} nodes"),
                    e,
                )
            })?;

        Ok(rows
            .into_iter()
            .map(|row| HierarchyRecord {
                id: row.id,
                layer,
                is_private: row.is_private,
                parent_id: Some(row.parent_id),
                parent_layer: Some(parent_layer),
                creator_id: row.creator_id,
                is_archived: row.is_archived,
            })
            .collect())
    }

    async fn fetch_lists(&self, ids: &[Uuid]) -> AppResult<Vec<HierarchyRecord>> {
        let rows = sqlx::query_as::<_, ListRow>(
            "SELECT id, space_id, folder_id, is_private, creator_id, is_archived \
             FROM lists WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch lists", e))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let (parent_id, parent_layer) = match row.folder_id {
                    Some(folder_id) => (folder_id, EntityLayer::Folder),
                    None => (row.space_id, EntityLayer::Space),
                };
                HierarchyRecord {
                    id: row.id,
                    layer: EntityLayer::List,
                    is_private: row.is_private,
                    parent_id: Some(parent_id),
                    parent_layer: Some(parent_layer),
                    creator_id: row.creator_id,
                    is_archived: row.is_archived,
                }
            })
            .collect())
    }

    async fn fetch_leaves(
        &self,
        query: &str,
        layer: EntityLayer,
        parent_layer: EntityLayer,
        ids: &[Uuid],
    ) -> AppResult<Vec<HierarchyRecord>> {
        let rows = sqlx::query_as::<_, LeafRow>(query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to fetch {layer} nodes"),
                    e,
                )
            })?;

        Ok(rows
            .into_iter()
            .map(|row| HierarchyRecord {
                id: row.id,
                layer,
                is_private: false,
                parent_id: Some(row.parent_id),
                parent_layer: Some(parent_layer),
                creator_id: row.creator_id,
                is_archived: row.is_archived,
            })
            .collect())
    }
}

#[async_trait]
impl HierarchyStore for PgHierarchyStore {
    async fn get_nodes(
        &self,
        layer: EntityLayer,
        ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, HierarchyRecord>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let records = match layer {
            EntityLayer::Workspace => self.fetch_workspaces(ids).await?,
            EntityLayer::Space => {
                self.fetch_containers(
                    "SELECT id, workspace_id AS parent_id, is_private, creator_id, is_archived \
                     FROM spaces WHERE id = ANY($1)",
                    EntityLayer::Space,
                    EntityLayer::Workspace,
                    ids,
                )
                .await?
            }
            EntityLayer::Folder => {
                self.fetch_containers(
                    "SELECT id, space_id AS parent_id, is_private, creator_id, is_archived \
                     FROM folders WHERE id = ANY($1)",
                    EntityLayer::Folder,
                    EntityLayer::Space,
                    ids,
                )
                .await?
            }
            EntityLayer::List => self.fetch_lists(ids).await?,
            EntityLayer::Task => {
                self.fetch_leaves(
                    "SELECT id, list_id AS parent_id, creator_id, is_archived \
                     FROM tasks WHERE id = ANY($1)",
                    EntityLayer::Task,
                    EntityLayer::List,
                    ids,
                )
                .await?
            }
            EntityLayer::ChatRoom => {
                self.fetch_containers(
                    "SELECT id, workspace_id AS parent_id, is_private, creator_id, is_archived \
                     FROM chat_rooms WHERE id = ANY($1)",
                    EntityLayer::ChatRoom,
                    EntityLayer::Workspace,
                    ids,
                )
                .await?
            }
            EntityLayer::ChatMessage => {
                self.fetch_leaves(
                    "SELECT id, chat_room_id AS parent_id, creator_id, FALSE AS is_archived \
                     FROM chat_messages WHERE id = ANY($1)",
                    EntityLayer::ChatMessage,
                    EntityLayer::ChatRoom,
                    ids,
                )
                .await?
            }
        };

        Ok(records.into_iter().map(|r| (r.id, r)).collect())
    }
}
