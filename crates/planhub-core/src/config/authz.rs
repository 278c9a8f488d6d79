//! Authorization engine configuration.

use serde::{Deserialize, Serialize};

/// Tuning knobs for the authorization resolution engine.
///
/// TTLs are stated in seconds. Cached permission state is advisory:
/// correctness after a role/grant change depends on the mutating caller
/// invalidating the affected tags, not on these expiry windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthzConfig {
    /// TTL for cached workspace role lookups.
    #[serde(default = "default_role_ttl")]
    pub role_ttl_seconds: u64,
    /// TTL for cached hierarchy paths.
    #[serde(default = "default_path_ttl")]
    pub path_ttl_seconds: u64,
    /// TTL for cached access-grant chains.
    #[serde(default = "default_grant_ttl")]
    pub grant_ttl_seconds: u64,
    /// TTL for cached chat membership state.
    #[serde(default = "default_chat_ttl")]
    pub chat_ttl_seconds: u64,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            role_ttl_seconds: default_role_ttl(),
            path_ttl_seconds: default_path_ttl(),
            grant_ttl_seconds: default_grant_ttl(),
            chat_ttl_seconds: default_chat_ttl(),
        }
    }
}

fn default_role_ttl() -> u64 {
    300
}

fn default_path_ttl() -> u64 {
    300
}

fn default_grant_ttl() -> u64 {
    300
}

fn default_chat_ttl() -> u64 {
    300
}
