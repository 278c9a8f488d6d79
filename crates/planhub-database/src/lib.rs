//! # planhub-database
//!
//! PostgreSQL connection management and implementations of the store
//! ports the authorization engine consumes.

pub mod connection;
pub mod repositories;

pub use connection::DatabasePool;
