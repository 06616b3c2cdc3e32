//! Content item store contract and SQLite implementation.
//!
//! # Responsibility
//! - Look up items by id (resolution) and by `(type, slug)` (routing).
//!
//! # Invariants
//! - `(content_type, slug)` is unique, so slug routing is unambiguous.

use crate::model::content::{ContentItem, ItemId};
use crate::repo::{parse_item_id, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Read access to host content items.
pub trait ContentStore {
    fn get_item(&self, id: ItemId) -> RepoResult<Option<ContentItem>>;
    fn find_by_slug(&self, content_type: &str, slug: &str) -> RepoResult<Option<ContentItem>>;
}

/// SQLite-backed content store.
pub struct SqliteContentStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContentStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Inserts one item. Host-side write used by fixtures and the CLI.
    pub fn create_item(&self, item: &ContentItem) -> RepoResult<ItemId> {
        if item.slug.trim().is_empty() || item.slug.contains('/') {
            return Err(RepoError::InvalidData(format!(
                "item slug `{}` must be non-empty and contain no `/`",
                item.slug
            )));
        }

        self.conn.execute(
            "INSERT INTO content_items (uuid, content_type, slug) VALUES (?1, ?2, ?3);",
            params![
                item.id.to_string(),
                item.content_type.as_str(),
                item.slug.as_str()
            ],
        )?;
        Ok(item.id)
    }
}

impl ContentStore for SqliteContentStore<'_> {
    fn get_item(&self, id: ItemId) -> RepoResult<Option<ContentItem>> {
        let row = self
            .conn
            .query_row(
                "SELECT uuid, content_type, slug FROM content_items WHERE uuid = ?1;",
                [id.to_string()],
                read_raw_item,
            )
            .optional()?;
        row.map(parse_item).transpose()
    }

    fn find_by_slug(&self, content_type: &str, slug: &str) -> RepoResult<Option<ContentItem>> {
        let row = self
            .conn
            .query_row(
                "SELECT uuid, content_type, slug
                 FROM content_items
                 WHERE content_type = ?1 AND slug = ?2;",
                params![content_type, slug],
                read_raw_item,
            )
            .optional()?;
        row.map(parse_item).transpose()
    }
}

fn read_raw_item(row: &Row<'_>) -> rusqlite::Result<(String, String, String)> {
    Ok((row.get("uuid")?, row.get("content_type")?, row.get("slug")?))
}

fn parse_item((uuid, content_type, slug): (String, String, String)) -> RepoResult<ContentItem> {
    let id = parse_item_id(&uuid, "content_items.uuid")?;
    Ok(ContentItem::with_id(id, content_type, slug))
}
