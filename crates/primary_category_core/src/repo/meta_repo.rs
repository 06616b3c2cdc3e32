//! Item metadata store contract and SQLite implementation.
//!
//! # Responsibility
//! - Key/value metadata per content item.
//! - Bulk lookups/deletes by `(key, value)` for term-deletion cleanup.
//!
//! # Invariants
//! - At most one value per `(item, key)`; `set_meta` overwrites.

use crate::model::content::ItemId;
use crate::repo::{parse_item_id, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Key/value metadata attached to host content items.
pub trait MetaStore {
    fn get_meta(&self, item_id: ItemId, key: &str) -> RepoResult<Option<String>>;
    fn set_meta(&self, item_id: ItemId, key: &str, value: &str) -> RepoResult<()>;
    /// Returns whether a value existed.
    fn delete_meta(&self, item_id: ItemId, key: &str) -> RepoResult<bool>;
    /// Returns the number of removed entries.
    fn delete_meta_by_value(&self, key: &str, value: &str) -> RepoResult<usize>;
    fn items_with_meta_value(&self, key: &str, value: &str) -> RepoResult<Vec<ItemId>>;
}

/// SQLite-backed metadata store.
pub struct SqliteMetaStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMetaStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl MetaStore for SqliteMetaStore<'_> {
    fn get_meta(&self, item_id: ItemId, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT meta_value FROM item_meta WHERE item_uuid = ?1 AND meta_key = ?2;",
                params![item_id.to_string(), key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_meta(&self, item_id: ItemId, key: &str, value: &str) -> RepoResult<()> {
        let item_uuid = item_id.to_string();
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM content_items WHERE uuid = ?1);",
            [item_uuid.as_str()],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::ItemNotFound(item_id));
        }

        self.conn.execute(
            "INSERT INTO item_meta (item_uuid, meta_key, meta_value) VALUES (?1, ?2, ?3)
             ON CONFLICT (item_uuid, meta_key) DO UPDATE SET meta_value = excluded.meta_value;",
            params![item_uuid.as_str(), key, value],
        )?;
        Ok(())
    }

    fn delete_meta(&self, item_id: ItemId, key: &str) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM item_meta WHERE item_uuid = ?1 AND meta_key = ?2;",
            params![item_id.to_string(), key],
        )?;
        Ok(changed > 0)
    }

    fn delete_meta_by_value(&self, key: &str, value: &str) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "DELETE FROM item_meta WHERE meta_key = ?1 AND meta_value = ?2;",
            params![key, value],
        )?;
        Ok(changed)
    }

    fn items_with_meta_value(&self, key: &str, value: &str) -> RepoResult<Vec<ItemId>> {
        let mut stmt = self.conn.prepare(
            "SELECT item_uuid
             FROM item_meta
             WHERE meta_key = ?1 AND meta_value = ?2
             ORDER BY item_uuid ASC;",
        )?;
        let mut rows = stmt.query(params![key, value])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get(0)?;
            ids.push(parse_item_id(&uuid_text, "item_meta.item_uuid")?);
        }
        Ok(ids)
    }
}
