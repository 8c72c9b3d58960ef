//! Time-bounded response cache persisted in the shared key-value store.
//!
//! Entries live under `anime_cache_<logical key>` as `{timestamp, data}`,
//! with `timestamp` in epoch milliseconds. An entry older than the TTL is
//! treated as absent and removed on the next read.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::error::AnimedexError;
use crate::kv::SharedStore;

pub const CACHE_PREFIX: &str = "anime_cache_";

/// How long a cached response stays fresh, in minutes.
pub const DEFAULT_TTL_MINUTES: i64 = 30;

/// Logical query keys. Equal queries always produce equal keys.
pub mod keys {
    pub fn search(query: &str) -> String {
        format!("search_{query}")
    }

    pub fn details(id: u64) -> String {
        format!("details_{id}")
    }

    pub fn top() -> String {
        "top_anime".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub timestamp: i64,
    pub data: T,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, now: DateTime<Utc>) -> Self {
        Self {
            timestamp: now.timestamp_millis(),
            data,
        }
    }

    /// Fresh iff `now - timestamp <= ttl`.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now.timestamp_millis() - self.timestamp <= ttl.num_milliseconds()
    }
}

/// Read-through cache over a [`SharedStore`].
#[derive(Clone)]
pub struct ResponseCache {
    store: SharedStore,
    clock: Arc<dyn Clock>,
    ttl: TimeDelta,
}

impl ResponseCache {
    pub fn new(store: SharedStore) -> Self {
        Self::with_clock(
            store,
            Arc::new(SystemClock),
            TimeDelta::minutes(DEFAULT_TTL_MINUTES),
        )
    }

    pub fn with_clock(store: SharedStore, clock: Arc<dyn Clock>, ttl: TimeDelta) -> Self {
        Self { store, clock, ttl }
    }

    fn storage_key(key: &str) -> String {
        format!("{CACHE_PREFIX}{key}")
    }

    /// Return the cached payload for `key` if present and fresh.
    ///
    /// Stale entries are evicted. Unreadable or corrupt entries count as a miss.
    pub fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let storage_key = Self::storage_key(key);
        let raw = match self.store.get(&storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "Error reading from cache");
                return None;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding corrupt cache entry");
                self.evict(&storage_key);
                return None;
            }
        };

        if entry.is_fresh(self.clock.now(), self.ttl) {
            tracing::debug!(key, "cache hit");
            Some(entry.data)
        } else {
            tracing::debug!(key, "cache entry expired");
            self.evict(&storage_key);
            None
        }
    }

    /// Write `data` under `key`, stamped with the current time.
    ///
    /// Best-effort: failures are logged and otherwise ignored.
    pub fn store<T: Serialize>(&self, key: &str, data: &T) {
        let entry = CacheEntry::new(data, self.clock.now());
        let result = serde_json::to_string(&entry)
            .map_err(AnimedexError::from)
            .and_then(|json| self.store.set(&Self::storage_key(key), &json));
        if let Err(e) = result {
            tracing::warn!(key, error = %e, "Error writing to cache");
        }
    }

    /// Return the fresh cached value for `key`, or run `fetch` and cache its result.
    ///
    /// Errors from `fetch` propagate unchanged and nothing is cached for them.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: &str, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.lookup(key) {
            return Ok(hit);
        }
        tracing::debug!(key, "cache miss");
        let value = fetch().await?;
        self.store(key, &value);
        Ok(value)
    }

    /// Remove every expired or unreadable cache entry. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize, AnimedexError> {
        let now = self.clock.now();
        let mut removed = 0;
        for storage_key in self.store.keys_with_prefix(CACHE_PREFIX)? {
            let fresh = self
                .store
                .get(&storage_key)?
                .and_then(|raw| serde_json::from_str::<CacheEntry<serde_json::Value>>(&raw).ok())
                .is_some_and(|entry| entry.is_fresh(now, self.ttl));
            if !fresh {
                self.store.remove(&storage_key)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Remove every cache entry. Returns how many were removed.
    pub fn clear(&self) -> Result<usize, AnimedexError> {
        let keys = self.store.keys_with_prefix(CACHE_PREFIX)?;
        for storage_key in &keys {
            self.store.remove(storage_key)?;
        }
        Ok(keys.len())
    }

    fn evict(&self, storage_key: &str) {
        if let Err(e) = self.store.remove(storage_key) {
            tracing::warn!(key = storage_key, error = %e, "Failed to evict cache entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::clock::ManualClock;
    use crate::kv::{KeyValueStore, MemoryStore};
    use crate::models::CatalogItem;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn ttl() -> TimeDelta {
        TimeDelta::minutes(DEFAULT_TTL_MINUTES)
    }

    fn setup() -> (Arc<MemoryStore>, Arc<ManualClock>, ResponseCache) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(start()));
        let cache = ResponseCache::with_clock(store.clone(), clock.clone(), ttl());
        (store, clock, cache)
    }

    /// Store whose writes always fail, as when the quota is exhausted.
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>, AnimedexError> {
            Ok(None)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), AnimedexError> {
            Err(AnimedexError::Io(std::io::Error::other("quota exceeded")))
        }
        fn remove(&self, _key: &str) -> Result<(), AnimedexError> {
            Ok(())
        }
        fn keys_with_prefix(&self, _prefix: &str) -> Result<Vec<String>, AnimedexError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_keys_are_deterministic() {
        assert_eq!(keys::search("frieren"), keys::search("frieren"));
        assert_eq!(keys::search("frieren"), "search_frieren");
        assert_eq!(keys::details(52991), "details_52991");
        assert_eq!(keys::top(), "top_anime");
    }

    #[tokio::test]
    async fn test_fresh_entry_skips_fetch_until_ttl_passes() {
        let (_store, clock, cache) = setup();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let fetch = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(vec![1u64, 2, 3])
        };

        cache.get_or_fetch("top_anime", fetch).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(TimeDelta::minutes(29));
        let hit = cache.get_or_fetch("top_anime", fetch).await.unwrap();
        assert_eq!(hit, vec![1, 2, 3]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(TimeDelta::minutes(2));
        cache.get_or_fetch("top_anime", fetch).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_entry_exactly_at_ttl_is_fresh() {
        let (_store, clock, cache) = setup();
        cache.store("k", &"v");
        clock.advance(ttl());
        assert_eq!(cache.lookup::<String>("k").as_deref(), Some("v"));
        clock.advance(TimeDelta::milliseconds(1));
        assert_eq!(cache.lookup::<String>("k"), None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_evicted_on_read() {
        let (store, clock, cache) = setup();
        cache.store("search_naruto", &vec!["a".to_string()]);
        assert!(store.get("anime_cache_search_naruto").unwrap().is_some());

        clock.advance(TimeDelta::minutes(31));
        assert_eq!(cache.lookup::<Vec<String>>("search_naruto"), None);
        assert!(store.get("anime_cache_search_naruto").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_error_propagates_and_is_not_cached() {
        let (store, _clock, cache) = setup();
        let result: Result<Vec<u64>, String> = cache
            .get_or_fetch("top_anime", || async { Err("rate limited".to_string()) })
            .await;
        assert_eq!(result, Err("rate limited".to_string()));
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_still_returns_result() {
        let cache = ResponseCache::new(Arc::new(ReadOnlyStore));
        let value = cache
            .get_or_fetch("top_anime", || async { Ok::<_, String>(42u32) })
            .await
            .unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let (store, _clock, cache) = setup();
        store.set("anime_cache_details_1", "{not json").unwrap();

        let value = cache
            .get_or_fetch("details_1", || async { Ok::<_, String>(7u32) })
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(cache.lookup::<u32>("details_1"), Some(7));
    }

    #[test]
    fn test_stored_layout() {
        let (store, _clock, cache) = setup();
        cache.store("details_5", &CatalogItem::new(5, "Cowboy Bebop"));

        let raw = store.get("anime_cache_details_5").unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["timestamp"], start().timestamp_millis());
        assert_eq!(json["data"]["title"], "Cowboy Bebop");
    }

    #[test]
    fn test_cached_item_round_trips() {
        let (_store, _clock, cache) = setup();
        let mut item = CatalogItem::new(52991, "Sousou no Frieren");
        item.rating = Some(9.32);
        item.genres = Some(vec!["Adventure".into(), "Drama".into()]);
        cache.store("details_52991", &item);

        let back: CatalogItem = cache.lookup("details_52991").unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_purge_and_clear() {
        let (store, clock, cache) = setup();
        cache.store("old", &1);
        clock.advance(TimeDelta::minutes(20));
        cache.store("new", &2);
        store.set("anime_cache_broken", "garbage").unwrap();
        store.set("anime_favorites", "[1]").unwrap();
        clock.advance(TimeDelta::minutes(15));

        assert_eq!(cache.purge_expired().unwrap(), 2);
        assert_eq!(cache.lookup::<i32>("new"), Some(2));

        assert_eq!(cache.clear().unwrap(), 1);
        assert_eq!(store.keys_with_prefix(CACHE_PREFIX).unwrap().len(), 0);
        assert!(store.get("anime_favorites").unwrap().is_some());
    }
}
