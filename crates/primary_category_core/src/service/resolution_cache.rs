//! Advisory cache of resolved primary terms.
//!
//! # Responsibility
//! - Store `ResolvedPrimary` per item under a typed key with a TTL.
//!
//! # Invariants
//! - Reads never fail: store errors and undecodable entries are misses.
//! - Correctness never depends on a hit; the resolver recomputes on miss.

use crate::model::content::ItemId;
use crate::model::primary::ResolvedPrimary;
use crate::repo::transient_repo::{CacheKey, EphemeralStore};
use crate::repo::{RepoError, RepoResult};
use log::warn;
use std::time::Duration;

/// Namespace of resolution entries in the ephemeral store.
pub const RESOLUTION_CACHE_NAMESPACE: &str = "primary_category";

#[derive(Clone, Copy)]
pub struct ResolutionCache<'a> {
    store: &'a dyn EphemeralStore,
}

impl<'a> ResolutionCache<'a> {
    pub fn new(store: &'a dyn EphemeralStore) -> Self {
        Self { store }
    }

    pub fn get(&self, item_id: ItemId) -> Option<ResolvedPrimary> {
        let key = Self::key(item_id);
        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(
                    "event=cache_get module=resolution_cache status=error item_id={} error={}",
                    item_id, err
                );
                return None;
            }
        };

        match serde_json::from_str::<ResolvedPrimary>(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    "event=cache_decode module=resolution_cache status=error item_id={} error={}",
                    item_id, err
                );
                if let Err(err) = self.store.delete(&key) {
                    warn!(
                        "event=cache_delete module=resolution_cache status=error item_id={} error={}",
                        item_id, err
                    );
                }
                None
            }
        }
    }

    pub fn put(&self, item_id: ItemId, value: &ResolvedPrimary, ttl: Duration) -> RepoResult<()> {
        let encoded = serde_json::to_string(value).map_err(|err| {
            RepoError::InvalidData(format!("failed to encode resolution: {err}"))
        })?;
        self.store.set(&Self::key(item_id), &encoded, ttl)
    }

    pub fn invalidate(&self, item_id: ItemId) -> RepoResult<()> {
        self.store.delete(&Self::key(item_id))
    }

    fn key(item_id: ItemId) -> CacheKey {
        CacheKey::new(RESOLUTION_CACHE_NAMESPACE, item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::{ResolutionCache, RESOLUTION_CACHE_NAMESPACE};
    use crate::model::primary::{ResolutionSource, ResolvedPrimary};
    use crate::repo::transient_repo::{CacheKey, EphemeralStore, MemoryTransientStore};
    use std::time::Duration;
    use uuid::Uuid;

    fn sports() -> ResolvedPrimary {
        ResolvedPrimary {
            term_id: 7,
            name: "Sports".to_string(),
            slug: "sports".to_string(),
            source: ResolutionSource::Selected,
        }
    }

    #[test]
    fn put_get_invalidate() {
        let store = MemoryTransientStore::new();
        let cache = ResolutionCache::new(&store);
        let item_id = Uuid::new_v4();

        assert!(cache.get(item_id).is_none());
        cache
            .put(item_id, &sports(), Duration::from_secs(60))
            .unwrap();
        assert_eq!(cache.get(item_id), Some(sports()));

        cache.invalidate(item_id).unwrap();
        assert!(cache.get(item_id).is_none());
    }

    #[test]
    fn expired_entries_read_as_absent() {
        let store = MemoryTransientStore::new();
        let cache = ResolutionCache::new(&store);
        let item_id = Uuid::new_v4();

        cache.put(item_id, &sports(), Duration::ZERO).unwrap();
        assert!(cache.get(item_id).is_none());
    }

    #[test]
    fn undecodable_entry_is_a_miss_and_is_dropped() {
        let store = MemoryTransientStore::new();
        let item_id = Uuid::new_v4();
        let key = CacheKey::new(RESOLUTION_CACHE_NAMESPACE, item_id);
        store.set(&key, "Sports", Duration::from_secs(60)).unwrap();

        let cache = ResolutionCache::new(&store);
        assert!(cache.get(item_id).is_none());
        assert!(store.get(&key).unwrap().is_none());
    }
}
