//! Term/taxonomy store contract and SQLite implementation.
//!
//! # Responsibility
//! - Expose an item's assigned terms per taxonomy in stable store order.
//! - Answer taxonomy shape questions used at config build time.
//!
//! # Invariants
//! - `assigned_terms` order is the assignment order (`position`), never
//!   alphabetical.
//! - `set_item_terms` replaces one taxonomy's assignment set atomically.

use crate::model::content::ItemId;
use crate::model::term::{Taxonomy, Term, TermId};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Read-only view over host taxonomy data.
pub trait TermStore {
    /// Terms assigned to `item_id` within `taxonomy`, in store order.
    fn assigned_terms(&self, item_id: ItemId, taxonomy: &str) -> RepoResult<Vec<Term>>;
    fn get_term(&self, term_id: TermId, taxonomy: &str) -> RepoResult<Option<Term>>;
    fn get_term_by_slug(&self, slug: &str, taxonomy: &str) -> RepoResult<Option<Term>>;
    /// Unknown taxonomies report `false`.
    fn is_hierarchical(&self, taxonomy: &str) -> RepoResult<bool>;
}

/// SQLite-backed term store.
pub struct SqliteTermStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTermStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Registers or updates one taxonomy.
    pub fn upsert_taxonomy(&self, taxonomy: &Taxonomy) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO taxonomies (name, hierarchical) VALUES (?1, ?2)
             ON CONFLICT (name) DO UPDATE SET hierarchical = excluded.hierarchical;",
            params![taxonomy.name.as_str(), i64::from(taxonomy.hierarchical)],
        )?;
        Ok(())
    }

    /// Creates one term and returns its id.
    pub fn create_term(&self, taxonomy: &str, slug: &str, name: &str) -> RepoResult<TermId> {
        if !self.taxonomy_exists(taxonomy)? {
            return Err(RepoError::TaxonomyNotFound(taxonomy.to_string()));
        }
        self.conn.execute(
            "INSERT INTO terms (taxonomy, slug, name) VALUES (?1, ?2, ?3);",
            params![taxonomy, slug, name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Creates one term with a caller-provided id.
    pub fn create_term_with_id(
        &self,
        term_id: TermId,
        taxonomy: &str,
        slug: &str,
        name: &str,
    ) -> RepoResult<TermId> {
        if !self.taxonomy_exists(taxonomy)? {
            return Err(RepoError::TaxonomyNotFound(taxonomy.to_string()));
        }
        self.conn.execute(
            "INSERT INTO terms (id, taxonomy, slug, name) VALUES (?1, ?2, ?3, ?4);",
            params![term_id, taxonomy, slug, name],
        )?;
        Ok(term_id)
    }

    /// Replaces the assignment set of `item_id` within `taxonomy`.
    ///
    /// Slice order becomes store order.
    pub fn set_item_terms(
        &self,
        item_id: ItemId,
        taxonomy: &str,
        term_ids: &[TermId],
    ) -> RepoResult<()> {
        let item_uuid = item_id.to_string();
        let tx = self.conn.unchecked_transaction()?;

        let item_exists: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM content_items WHERE uuid = ?1);",
            [item_uuid.as_str()],
            |row| row.get(0),
        )?;
        if item_exists != 1 {
            return Err(RepoError::ItemNotFound(item_id));
        }

        tx.execute(
            "DELETE FROM term_assignments
             WHERE item_uuid = ?1
               AND term_id IN (SELECT id FROM terms WHERE taxonomy = ?2);",
            params![item_uuid.as_str(), taxonomy],
        )?;

        for (position, term_id) in term_ids.iter().enumerate() {
            let term_exists: i64 = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM terms WHERE id = ?1 AND taxonomy = ?2);",
                params![term_id, taxonomy],
                |row| row.get(0),
            )?;
            if term_exists != 1 {
                return Err(RepoError::TermNotFound(*term_id));
            }
            tx.execute(
                "INSERT OR IGNORE INTO term_assignments (item_uuid, term_id, position)
                 VALUES (?1, ?2, ?3);",
                params![item_uuid.as_str(), term_id, position as i64],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Deletes one term; assignments cascade.
    ///
    /// Callers notify the engine afterwards so selections get cleaned up.
    pub fn delete_term(&self, term_id: TermId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM terms WHERE id = ?1;", [term_id])?;
        if changed == 0 {
            return Err(RepoError::TermNotFound(term_id));
        }
        Ok(())
    }

    fn taxonomy_exists(&self, taxonomy: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM taxonomies WHERE name = ?1);",
            [taxonomy],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl TermStore for SqliteTermStore<'_> {
    fn assigned_terms(&self, item_id: ItemId, taxonomy: &str) -> RepoResult<Vec<Term>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.taxonomy, t.slug, t.name
             FROM term_assignments a
             INNER JOIN terms t ON t.id = a.term_id
             WHERE a.item_uuid = ?1
               AND t.taxonomy = ?2
             ORDER BY a.position ASC, t.id ASC;",
        )?;
        let mut rows = stmt.query(params![item_id.to_string(), taxonomy])?;
        let mut terms = Vec::new();
        while let Some(row) = rows.next()? {
            terms.push(parse_term_row(row)?);
        }
        Ok(terms)
    }

    fn get_term(&self, term_id: TermId, taxonomy: &str) -> RepoResult<Option<Term>> {
        let term = self
            .conn
            .query_row(
                "SELECT id, taxonomy, slug, name FROM terms WHERE id = ?1 AND taxonomy = ?2;",
                params![term_id, taxonomy],
                parse_term_row,
            )
            .optional()?;
        Ok(term)
    }

    fn get_term_by_slug(&self, slug: &str, taxonomy: &str) -> RepoResult<Option<Term>> {
        let term = self
            .conn
            .query_row(
                "SELECT id, taxonomy, slug, name FROM terms WHERE slug = ?1 AND taxonomy = ?2;",
                params![slug, taxonomy],
                parse_term_row,
            )
            .optional()?;
        Ok(term)
    }

    fn is_hierarchical(&self, taxonomy: &str) -> RepoResult<bool> {
        let flag = self
            .conn
            .query_row(
                "SELECT hierarchical FROM taxonomies WHERE name = ?1;",
                [taxonomy],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        match flag {
            None | Some(0) => Ok(false),
            Some(1) => Ok(true),
            Some(other) => Err(RepoError::InvalidData(format!(
                "invalid hierarchical value `{other}` in taxonomies.hierarchical"
            ))),
        }
    }
}

fn parse_term_row(row: &Row<'_>) -> rusqlite::Result<Term> {
    Ok(Term {
        id: row.get("id")?,
        taxonomy: row.get("taxonomy")?,
        slug: row.get("slug")?,
        name: row.get("name")?,
    })
}
