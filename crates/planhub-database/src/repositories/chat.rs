//! Chat room membership store implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use planhub_authz::ChatStore;
use planhub_core::error::{AppError, ErrorKind};
use planhub_core::result::AppResult;
use planhub_entity::chat::ChatMemberState;

use crate::connection::DatabasePool;

/// PostgreSQL-backed chat room membership store.
#[derive(Debug, Clone)]
pub struct PgChatStore {
    pool: PgPool,
}

impl PgChatStore {
    /// Create a new chat store over the shared pool.
    pub fn new(db: &DatabasePool) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }
}

#[async_trait]
impl ChatStore for PgChatStore {
    async fn get_chat_state(
        &self,
        user_id: Uuid,
        chat_room_id: Uuid,
    ) -> AppResult<Option<ChatMemberState>> {
        sqlx::query_as::<_, ChatMemberState>(
            "SELECT chat_room_id, user_id, role, is_banned, muted_until \
             FROM chat_room_members WHERE user_id = $1 AND chat_room_id = $2",
        )
        .bind(user_id)
        .bind(chat_room_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to fetch chat member state", e)
        })
    }
}
