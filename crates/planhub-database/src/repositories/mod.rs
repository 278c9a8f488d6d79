//! Store implementations backed by PostgreSQL.

pub mod chat;
pub mod grant;
pub mod hierarchy;
pub mod membership;

pub use chat::PgChatStore;
pub use grant::PgGrantStore;
pub use hierarchy::PgHierarchyStore;
pub use membership::PgMembershipStore;
