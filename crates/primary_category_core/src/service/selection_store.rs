//! Persisted primary-category selection per item.
//!
//! # Responsibility
//! - Map item id to at most one selected term id over item metadata.
//!
//! # Invariants
//! - Only the resolver and lifecycle cleanup write through this store.
//! - A stored id is never trusted on read; callers validate it against the
//!   current assignment set.

use crate::model::content::ItemId;
use crate::model::term::TermId;
use crate::repo::meta_repo::MetaStore;
use crate::repo::{RepoError, RepoResult};

/// Metadata key holding the selected term id.
pub const PRIMARY_CATEGORY_META_KEY: &str = "_primary_category";

/// Key/value view of selections.
#[derive(Clone, Copy)]
pub struct SelectionStore<'a> {
    meta: &'a dyn MetaStore,
}

impl<'a> SelectionStore<'a> {
    pub fn new(meta: &'a dyn MetaStore) -> Self {
        Self { meta }
    }

    /// Reads the stored selection.
    ///
    /// # Errors
    /// - `InvalidData` when the stored value is not an integer term id.
    pub fn get(&self, item_id: ItemId) -> RepoResult<Option<TermId>> {
        let Some(raw) = self.meta.get_meta(item_id, PRIMARY_CATEGORY_META_KEY)? else {
            return Ok(None);
        };
        raw.trim().parse::<TermId>().map(Some).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid term id `{raw}` in item meta `{PRIMARY_CATEGORY_META_KEY}`"
            ))
        })
    }

    /// Items whose stored selection equals `term_id`.
    pub fn items_selecting(&self, term_id: TermId) -> RepoResult<Vec<ItemId>> {
        self.meta
            .items_with_meta_value(PRIMARY_CATEGORY_META_KEY, &term_id.to_string())
    }

    pub(crate) fn put(&self, item_id: ItemId, term_id: TermId) -> RepoResult<()> {
        self.meta
            .set_meta(item_id, PRIMARY_CATEGORY_META_KEY, &term_id.to_string())
    }

    pub(crate) fn clear(&self, item_id: ItemId) -> RepoResult<bool> {
        self.meta.delete_meta(item_id, PRIMARY_CATEGORY_META_KEY)
    }

    /// Removes every selection of `term_id`; returns the removed count.
    pub(crate) fn clear_term(&self, term_id: TermId) -> RepoResult<usize> {
        self.meta
            .delete_meta_by_value(PRIMARY_CATEGORY_META_KEY, &term_id.to_string())
    }
}
