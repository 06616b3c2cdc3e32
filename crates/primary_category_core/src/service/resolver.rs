//! Primary-category resolution policy.
//!
//! # Responsibility
//! - Decide whether explicit selection is active for an item.
//! - Validate and persist selections (single writer).
//! - Resolve the effective primary term, through the resolution cache.
//!
//! # Invariants
//! - A stored selection is honored only when the item has at least
//!   `MIN_ACTIVE_TERMS` assigned terms and the selected term is one of them.
//! - Otherwise resolution picks `assignment_fallback` from store order.
//! - Every selection write invalidates the item's cache entry.
//! - A cached resolution whose term was deleted is discarded on read, so
//!   fallback resolutions never outlive their term.
//! - A selection read failure degrades to "no selection"; it never fails
//!   resolution.

use crate::config::RewriteConfig;
use crate::model::content::{ContentItem, ItemId};
use crate::model::primary::{
    ResolutionSource, ResolvedPrimary, SelectionOption, SelectionOptions, MIN_ACTIVE_TERMS,
};
use crate::model::term::{Term, TermId};
use crate::repo::content_repo::ContentStore;
use crate::repo::term_repo::TermStore;
use crate::service::error::{EngineError, NotFoundTarget};
use crate::service::resolution_cache::ResolutionCache;
use crate::service::selection_store::SelectionStore;
use crate::service::HostStores;
use log::{debug, error, info, warn};

/// Central primary-category policy over host stores.
pub struct PrimaryCategoryResolver<'a> {
    config: &'a RewriteConfig,
    items: &'a dyn ContentStore,
    terms: &'a dyn TermStore,
    selections: SelectionStore<'a>,
    cache: ResolutionCache<'a>,
}

impl<'a> PrimaryCategoryResolver<'a> {
    pub fn new(config: &'a RewriteConfig, stores: HostStores<'a>) -> Self {
        Self {
            config,
            items: stores.items,
            terms: stores.terms,
            selections: SelectionStore::new(stores.meta),
            cache: ResolutionCache::new(stores.cache),
        }
    }

    pub fn config(&self) -> &'a RewriteConfig {
        self.config
    }

    pub fn terms(&self) -> &'a dyn TermStore {
        self.terms
    }

    pub fn selections(&self) -> SelectionStore<'a> {
        self.selections
    }

    pub fn cache(&self) -> ResolutionCache<'a> {
        self.cache
    }

    /// Returns the effective primary term of `item_id`.
    ///
    /// Missing items and unregistered types resolve to `None`.
    ///
    /// # Errors
    /// - `Storage` when the content or term store fails.
    pub fn resolve(&self, item_id: ItemId) -> Result<Option<ResolvedPrimary>, EngineError> {
        let Some(item) = self.items.get_item(item_id)? else {
            debug!("event=resolve module=resolver status=not_found item_id={item_id}");
            return Ok(None);
        };
        self.resolve_item(&item)
    }

    /// Same as `resolve` for an item the caller already holds.
    ///
    /// A cached value is served only while its term still exists.
    pub fn resolve_item(&self, item: &ContentItem) -> Result<Option<ResolvedPrimary>, EngineError> {
        let Some(taxonomy) = self.config.primary_taxonomy(&item.content_type) else {
            return Ok(None);
        };
        if let Some(hit) = self.cache.get(item.id) {
            if self.terms.get_term(hit.term_id, taxonomy)?.is_some() {
                return Ok(Some(hit));
            }
            debug!(
                "event=cache_get module=resolver status=stale item_id={} term_id={}",
                item.id, hit.term_id
            );
            if let Err(err) = self.cache.invalidate(item.id) {
                warn!(
                    "event=cache_invalidate module=resolver status=error item_id={} error={}",
                    item.id, err
                );
            }
        }
        self.compute(item, taxonomy)
    }

    /// Whether explicit selection is honored for `item_id`.
    ///
    /// Missing items and types without a primary-capable taxonomy are inactive.
    pub fn is_active(&self, item_id: ItemId) -> Result<bool, EngineError> {
        let Some(item) = self.items.get_item(item_id)? else {
            return Ok(false);
        };
        let Some(taxonomy) = self.config.primary_taxonomy(&item.content_type) else {
            return Ok(false);
        };
        let assigned = self.terms.assigned_terms(item.id, taxonomy)?;
        Ok(assigned.len() >= MIN_ACTIVE_TERMS)
    }

    /// Validates and persists the selection of `item_id`.
    ///
    /// `None` clears the selection. With fewer than `MIN_ACTIVE_TERMS`
    /// assigned terms a valid candidate also clears it.
    ///
    /// # Errors
    /// - `NotFound` when the item does not exist.
    /// - `Validation` when `term_id` is not assigned; prior selection kept.
    /// - `Storage` on store failures.
    pub fn set_selection(
        &self,
        item_id: ItemId,
        term_id: Option<TermId>,
    ) -> Result<(), EngineError> {
        let item = self.require_item(item_id)?;
        let assigned = match self.config.primary_taxonomy(&item.content_type) {
            Some(taxonomy) => self.terms.assigned_terms(item.id, taxonomy)?,
            None => Vec::new(),
        };

        match term_id {
            Some(candidate) if !assigned.iter().any(|term| term.id == candidate) => {
                warn!(
                    "event=selection_write module=resolver status=rejected item_id={} term_id={} assigned={}",
                    item_id,
                    candidate,
                    assigned.len()
                );
                Err(EngineError::Validation {
                    item_id,
                    term_id: candidate,
                })
            }
            Some(candidate) if assigned.len() >= MIN_ACTIVE_TERMS => {
                self.selections.put(item_id, candidate)?;
                self.cache.invalidate(item_id)?;
                info!(
                    "event=selection_write module=resolver status=ok item_id={item_id} term_id={candidate}"
                );
                Ok(())
            }
            _ => {
                let cleared = self.selections.clear(item_id)?;
                self.cache.invalidate(item_id)?;
                info!(
                    "event=selection_clear module=resolver status=ok item_id={} cleared={} assigned={}",
                    item_id,
                    cleared,
                    assigned.len()
                );
                Ok(())
            }
        }
    }

    /// Persists a selection without checking the assignment set.
    ///
    /// For hosts that validated elsewhere. Resolution ignores the stored id
    /// while it is not assigned.
    pub fn force_selection(
        &self,
        item_id: ItemId,
        term_id: Option<TermId>,
    ) -> Result<(), EngineError> {
        match term_id {
            Some(term_id) => self.selections.put(item_id, term_id)?,
            None => {
                self.selections.clear(item_id)?;
            }
        }
        self.cache.invalidate(item_id)?;
        debug!(
            "event=selection_force module=resolver status=ok item_id={} term_id={}",
            item_id,
            term_id.map_or_else(|| "-".to_string(), |id| id.to_string())
        );
        Ok(())
    }

    /// Raw stored selection, unvalidated.
    pub fn stored_selection(&self, item_id: ItemId) -> Result<Option<TermId>, EngineError> {
        Ok(self.selections.get(item_id)?)
    }

    /// Drops the cached resolution of `item_id`.
    pub fn invalidate(&self, item_id: ItemId) -> Result<(), EngineError> {
        Ok(self.cache.invalidate(item_id)?)
    }

    /// Editor-facing selection state.
    ///
    /// Returns `None` for missing items and types without a primary-capable
    /// taxonomy.
    pub fn selection_options(
        &self,
        item_id: ItemId,
    ) -> Result<Option<SelectionOptions>, EngineError> {
        let Some(item) = self.items.get_item(item_id)? else {
            return Ok(None);
        };
        let Some(taxonomy) = self.config.primary_taxonomy(&item.content_type) else {
            return Ok(None);
        };
        let assigned = self.terms.assigned_terms(item.id, taxonomy)?;
        let active = assigned.len() >= MIN_ACTIVE_TERMS;
        let selected = if active {
            self.valid_selection(item.id, &assigned).map(|term| term.id)
        } else {
            None
        };

        Ok(Some(SelectionOptions {
            taxonomy: taxonomy.to_string(),
            terms: assigned
                .into_iter()
                .map(|term| SelectionOption {
                    selected: Some(term.id) == selected,
                    term,
                })
                .collect(),
            active,
        }))
    }

    fn compute(
        &self,
        item: &ContentItem,
        taxonomy: &str,
    ) -> Result<Option<ResolvedPrimary>, EngineError> {
        let assigned = self.terms.assigned_terms(item.id, taxonomy)?;

        let selected = if assigned.len() >= MIN_ACTIVE_TERMS {
            self.valid_selection(item.id, &assigned)
        } else {
            None
        };
        let resolved = match selected {
            Some(term) => Some(ResolvedPrimary::from_term(term, ResolutionSource::Selected)),
            None => self
                .config
                .assignment_fallback
                .pick(&assigned)
                .map(|term| ResolvedPrimary::from_term(term, ResolutionSource::Fallback)),
        };

        if let Some(value) = resolved.as_ref() {
            if let Err(err) = self.cache.put(item.id, value, self.config.cache_ttl) {
                warn!(
                    "event=cache_put module=resolver status=error item_id={} error={}",
                    item.id, err
                );
            }
        }
        Ok(resolved)
    }

    /// Stored selection if it is still assigned. Read failures and stale ids
    /// yield `None`.
    fn valid_selection<'t>(&self, item_id: ItemId, assigned: &'t [Term]) -> Option<&'t Term> {
        let stored = match self.selections.get(item_id) {
            Ok(stored) => stored?,
            Err(err) => {
                error!(
                    "event=selection_read module=resolver status=degraded item_id={} error={}",
                    item_id, err
                );
                return None;
            }
        };
        let found = assigned.iter().find(|term| term.id == stored);
        if found.is_none() {
            debug!(
                "event=selection_read module=resolver status=stale item_id={item_id} term_id={stored}"
            );
        }
        found
    }

    fn require_item(&self, item_id: ItemId) -> Result<ContentItem, EngineError> {
        self.items
            .get_item(item_id)?
            .ok_or(EngineError::NotFound(NotFoundTarget::Item(item_id)))
    }
}
