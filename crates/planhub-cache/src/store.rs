//! Tag-aware read-through cache implementation.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use moka::Expiry;
use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use planhub_core::config::cache::CacheConfig;
use planhub_core::error::AppError;
use planhub_core::result::AppResult;

/// A cached value: serialized JSON, its requested TTL, and the tags it
/// was indexed under. The tags ride along so the eviction listener can
/// prune the tag index when moka drops the entry.
#[derive(Debug, Clone)]
struct CacheEntry {
    json: Arc<str>,
    ttl: Duration,
    tags: Arc<[String]>,
}

/// Per-entry expiry policy: each entry lives for the TTL it was
/// inserted with.
struct EntryTtl;

impl Expiry<String, CacheEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Tag-aware read-through cache for resolved authorization state.
///
/// Values are serialized as JSON. Every entry carries a set of tags;
/// removing a tag invalidates every key recorded under it, and when moka
/// expires or evicts an entry the eviction listener removes its key from
/// every tag set it was indexed under, so the tag index tracks the live
/// entry set instead of growing without bound. Concurrent
/// `get_or_create` calls for the same key are de-duplicated: only one
/// factory runs, the rest await its result. An entry only becomes
/// visible after its factory completed, so a cancelled (dropped)
/// resolution never publishes a partial value.
#[derive(Clone)]
pub struct AuthzCache {
    entries: Cache<String, CacheEntry>,
    tags: Arc<DashMap<String, HashSet<String>>>,
    default_ttl: Duration,
}

impl std::fmt::Debug for AuthzCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthzCache")
            .field("entries", &self.entries.entry_count())
            .field("tags", &self.tags.len())
            .finish()
    }
}

impl AuthzCache {
    /// Create a new cache from configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let tags: Arc<DashMap<String, HashSet<String>>> = Arc::new(DashMap::new());

        let index = Arc::clone(&tags);
        let entries = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(EntryTtl)
            .eviction_listener(move |key: Arc<String>, entry: CacheEntry, _cause| {
                for tag in entry.tags.iter() {
                    let mut now_empty = false;
                    if let Some(mut keys) = index.get_mut(tag) {
                        keys.remove(key.as_str());
                        now_empty = keys.is_empty();
                    }
                    if now_empty {
                        index.remove_if(tag, |_, keys| keys.is_empty());
                    }
                }
            })
            .build();

        Self {
            entries,
            tags,
            default_ttl: Duration::from_secs(config.default_ttl_seconds),
        }
    }

    /// The default TTL, used when a caller passes no explicit one.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Read-through lookup: return the cached value for `key`, or run
    /// `factory`, cache its result under the given tags, and return it.
    ///
    /// A failed factory caches nothing; the error is propagated to every
    /// concurrent waiter.
    pub async fn get_or_create<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        tags: &[String],
        factory: F,
    ) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let owned_key = key.to_string();
        let entry = self
            .entries
            .try_get_with(owned_key.clone(), async {
                let value = factory().await?;
                let json = serde_json::to_string(&value)?;
                self.index_tags(&owned_key, tags);
                debug!(key = %owned_key, "Cache entry populated");
                Ok::<_, AppError>(CacheEntry {
                    json: json.into(),
                    ttl,
                    tags: tags.into(),
                })
            })
            .await
            .map_err(|e: Arc<AppError>| (*e).clone())?;

        serde_json::from_str(&entry.json).map_err(Into::into)
    }

    /// Look up a cached value without populating on miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        match self.entries.get(key).await {
            Some(entry) => Ok(Some(serde_json::from_str(&entry.json)?)),
            None => Ok(None),
        }
    }

    /// Insert a value directly, replacing any existing entry.
    pub async fn insert<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
        tags: &[String],
    ) -> AppResult<()> {
        let json = serde_json::to_string(value)?;
        self.index_tags(key, tags);
        self.entries
            .insert(
                key.to_string(),
                CacheEntry {
                    json: json.into(),
                    ttl,
                    tags: tags.into(),
                },
            )
            .await;
        Ok(())
    }

    /// Remove a single key.
    pub async fn remove_by_key(&self, key: &str) {
        self.entries.remove(key).await;
    }

    /// Remove every key recorded under `tag`. Returns the number of keys
    /// invalidated.
    ///
    /// Keys may be recorded under several tags; the eviction listener
    /// prunes the removed keys from the other tag sets.
    pub async fn remove_by_tag(&self, tag: &str) -> u64 {
        let Some((_, keys)) = self.tags.remove(tag) else {
            return 0;
        };

        let mut count = 0u64;
        for key in keys {
            self.entries.remove(&key).await;
            count += 1;
        }
        debug!(tag, count, "Removed cache entries by tag");
        count
    }

    /// Drop every entry and the whole tag index.
    pub async fn clear(&self) {
        self.entries.invalidate_all();
        self.tags.clear();
    }

    fn index_tags(&self, key: &str, tags: &[String]) {
        for tag in tags {
            self.tags
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
    }
}
