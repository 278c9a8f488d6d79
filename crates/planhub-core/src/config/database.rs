//! Database configuration.

use serde::{Deserialize, Serialize};

/// PostgreSQL settings for the store adapters.
///
/// The engine issues short point reads and batched lookups only, never
/// long transactions, so the pool is sized for many small concurrent
/// acquisitions and gives up quickly when the database is saturated
/// (a slow permission check must fail closed, not queue).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub url: String,
    /// Number of connections the pool may hold.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// How long to wait for a free connection before failing, in seconds.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
    /// How long an idle connection is kept before being dropped, in
    /// seconds.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
}

fn default_pool_size() -> u32 {
    16
}

fn default_acquire_timeout() -> u64 {
    5
}

fn default_idle_timeout() -> u64 {
    600
}
