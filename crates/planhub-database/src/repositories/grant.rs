//! Access grant store implementation.
//!
//! Reads filter expired grants in SQL; writes upsert on the
//! `(entity_id, entity_layer, user_id)` key so re-granting replaces the
//! previous level and expiry instead of stacking rows.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use planhub_authz::{GrantStore, NewGrant};
use planhub_core::error::{AppError, ErrorKind};
use planhub_core::result::AppResult;
use planhub_entity::access::{AccessGrant, AccessLevel};
use planhub_entity::layer::EntityLayer;

use crate::connection::DatabasePool;

/// PostgreSQL-backed grant store.
#[derive(Debug, Clone)]
pub struct PgGrantStore {
    pool: PgPool,
}

impl PgGrantStore {
    /// Create a new grant store over the shared pool.
    pub fn new(db: &DatabasePool) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }
}

#[async_trait]
impl GrantStore for PgGrantStore {
    async fn get_grants(
        &self,
        user_id: Uuid,
        entity_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, AccessLevel>> {
        if entity_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let grants = sqlx::query_as::<_, AccessGrant>(
            "SELECT id, entity_id, entity_layer, user_id, level, granted_by, \
                    expires_at, created_at \
             FROM access_grants \
             WHERE user_id = $1 AND entity_id = ANY($2) \
               AND (expires_at IS NULL OR expires_at > NOW())",
        )
        .bind(user_id)
        .bind(entity_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch grants", e))?;

        // Entity ids are unique per layer in practice, but keep the higher
        // level if two rows ever collide on one id.
        let mut by_entity: HashMap<Uuid, AccessLevel> = HashMap::new();
        for grant in grants {
            by_entity
                .entry(grant.entity_id)
                .and_modify(|level| {
                    if grant.level.has_at_least(level) {
                        *level = grant.level;
                    }
                })
                .or_insert(grant.level);
        }
        Ok(by_entity)
    }

    async fn grant(&self, grant: NewGrant) -> AppResult<AccessGrant> {
        sqlx::query_as::<_, AccessGrant>(
            "INSERT INTO access_grants \
                 (id, entity_id, entity_layer, user_id, level, granted_by, expires_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW()) \
             ON CONFLICT (entity_id, entity_layer, user_id) DO UPDATE \
                 SET level = EXCLUDED.level, \
                     granted_by = EXCLUDED.granted_by, \
                     expires_at = EXCLUDED.expires_at \
             RETURNING id, entity_id, entity_layer, user_id, level, granted_by, \
                       expires_at, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(grant.entity_id)
        .bind(grant.entity_layer)
        .bind(grant.user_id)
        .bind(grant.level)
        .bind(grant.granted_by)
        .bind(grant.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create grant", e))
    }

    async fn revoke(
        &self,
        entity_id: Uuid,
        entity_layer: EntityLayer,
        user_id: Uuid,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM access_grants \
             WHERE entity_id = $1 AND entity_layer = $2 AND user_id = $3",
        )
        .bind(entity_id)
        .bind(entity_layer)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to revoke grant", e))?;

        Ok(result.rows_affected() > 0)
    }
}
