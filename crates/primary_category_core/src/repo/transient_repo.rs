//! Ephemeral value store contract with SQLite and in-process backends.
//!
//! # Responsibility
//! - Hold short-lived values under typed `(namespace, item)` keys.
//! - Expire entries lazily: an entry past its deadline reads as absent.
//!
//! # Invariants
//! - No background sweep; expired entries are dropped on the read that
//!   observes them.
//! - Per-key operations are atomic; concurrent writers resolve last-write-wins.

use crate::model::content::ItemId;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Typed cache key replacing string-concatenated transient names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub namespace: &'static str,
    pub item_id: ItemId,
}

impl CacheKey {
    pub fn new(namespace: &'static str, item_id: ItemId) -> Self {
        Self { namespace, item_id }
    }
}

/// Time-bounded key/value store.
pub trait EphemeralStore {
    fn get(&self, key: &CacheKey) -> RepoResult<Option<String>>;
    fn set(&self, key: &CacheKey, value: &str, ttl: Duration) -> RepoResult<()>;
    fn delete(&self, key: &CacheKey) -> RepoResult<()>;
}

/// SQLite-backed transient store.
pub struct SqliteTransientStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTransientStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EphemeralStore for SqliteTransientStore<'_> {
    fn get(&self, key: &CacheKey) -> RepoResult<Option<String>> {
        let item_uuid = key.item_id.to_string();
        let row = self
            .conn
            .query_row(
                "SELECT value, expires_at FROM transients WHERE namespace = ?1 AND item_uuid = ?2;",
                params![key.namespace, item_uuid.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        match row {
            Some((value, expires_at)) if expires_at > now_epoch_ms() => Ok(Some(value)),
            Some(_) => {
                self.conn.execute(
                    "DELETE FROM transients WHERE namespace = ?1 AND item_uuid = ?2;",
                    params![key.namespace, item_uuid.as_str()],
                )?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &CacheKey, value: &str, ttl: Duration) -> RepoResult<()> {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = now_epoch_ms().saturating_add(ttl_ms);
        self.conn.execute(
            "INSERT INTO transients (namespace, item_uuid, value, expires_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (namespace, item_uuid)
             DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at;",
            params![key.namespace, key.item_id.to_string(), value, expires_at],
        )?;
        Ok(())
    }

    fn delete(&self, key: &CacheKey) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM transients WHERE namespace = ?1 AND item_uuid = ?2;",
            params![key.namespace, key.item_id.to_string()],
        )?;
        Ok(())
    }
}

/// In-process transient store for hosts without a shared cache.
#[derive(Debug, Default)]
pub struct MemoryTransientStore {
    entries: Mutex<HashMap<CacheKey, MemoryEntry>>,
}

#[derive(Debug)]
struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl MemoryTransientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> RepoResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> RepoResult<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> RepoResult<std::sync::MutexGuard<'_, HashMap<CacheKey, MemoryEntry>>> {
        self.entries
            .lock()
            .map_err(|_| RepoError::LockPoisoned("memory transient store"))
    }
}

impl EphemeralStore for MemoryTransientStore {
    fn get(&self, key: &CacheKey) -> RepoResult<Option<String>> {
        let mut entries = self.lock()?;
        let expired = match entries.get(key) {
            None => return Ok(None),
            Some(entry) => entry
                .expires_at
                .is_some_and(|deadline| deadline <= Instant::now()),
        };
        if expired {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|entry| entry.value.clone()))
    }

    fn set(&self, key: &CacheKey, value: &str, ttl: Duration) -> RepoResult<()> {
        // `None` when the deadline overflows `Instant`; treated as no expiry.
        let expires_at = Instant::now().checked_add(ttl);
        self.lock()?.insert(
            *key,
            MemoryEntry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    fn delete(&self, key: &CacheKey) -> RepoResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{CacheKey, EphemeralStore, MemoryTransientStore};
    use std::time::Duration;
    use uuid::Uuid;

    #[test]
    fn memory_store_returns_live_values() {
        let store = MemoryTransientStore::new();
        let key = CacheKey::new("test", Uuid::new_v4());
        store.set(&key, "value", Duration::from_secs(60)).unwrap();
        assert_eq!(store.get(&key).unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn memory_store_expires_lazily_on_read() {
        let store = MemoryTransientStore::new();
        let key = CacheKey::new("test", Uuid::new_v4());
        store.set(&key, "value", Duration::ZERO).unwrap();
        assert_eq!(store.len().unwrap(), 1);

        assert!(store.get(&key).unwrap().is_none());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn memory_store_keys_are_namespaced() {
        let store = MemoryTransientStore::new();
        let item_id = Uuid::new_v4();
        let first = CacheKey::new("first", item_id);
        let second = CacheKey::new("second", item_id);
        store.set(&first, "a", Duration::from_secs(60)).unwrap();

        assert!(store.get(&second).unwrap().is_none());
        store.delete(&first).unwrap();
        assert!(store.get(&first).unwrap().is_none());
    }
}
