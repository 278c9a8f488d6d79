//! Workspace membership store implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use planhub_authz::MembershipStore;
use planhub_core::error::{AppError, ErrorKind};
use planhub_core::result::AppResult;
use planhub_entity::role::Membership;

use crate::connection::DatabasePool;

/// PostgreSQL-backed membership store.
#[derive(Debug, Clone)]
pub struct PgMembershipStore {
    pool: PgPool,
}

impl PgMembershipStore {
    /// Create a new membership store over the shared pool.
    pub fn new(db: &DatabasePool) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }
}

#[async_trait]
impl MembershipStore for PgMembershipStore {
    async fn get_membership(
        &self,
        user_id: Uuid,
        workspace_id: Uuid,
    ) -> AppResult<Option<Membership>> {
        sqlx::query_as::<_, Membership>(
            "SELECT user_id, workspace_id, role, status, created_at \
             FROM workspace_members WHERE user_id = $1 AND workspace_id = $2",
        )
        .bind(user_id)
        .bind(workspace_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch membership", e))
    }
}
