//! Host lifecycle notifications and the primary-category engine.
//!
//! # Responsibility
//! - Define the listener contract the host driver invokes synchronously on
//!   item save, term deletion and rewrite-rule rebuild.
//! - Keep listeners in an explicit registry instead of a global dispatcher.
//! - Provide `PrimaryCategoryEngine`, the listener wiring resolver, permalink
//!   rewriter and rule generator over one config and one set of stores.
//!
//! # Invariants
//! - Listeners run in registration order; ids are unique.
//! - Term-deletion cleanup only touches primary-capable taxonomies.
//! - Rule rebuild output keeps generated rules ahead of existing ones.

use crate::config::RewriteConfig;
use crate::model::content::{ContentItem, ItemId};
use crate::model::route::RouteRule;
use crate::model::term::TermId;
use crate::service::error::EngineError;
use crate::service::permalink::PermalinkRewriter;
use crate::service::resolver::PrimaryCategoryResolver;
use crate::service::route_rules::{generate_rules, merge_ahead, Dispatched, RouteError, RouteTable};
use crate::service::HostStores;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Push notifications from the host lifecycle driver.
///
/// Default implementations ignore the event.
pub trait LifecycleListener {
    /// An item was saved with the submitted primary-category choice.
    fn on_item_saved(&self, _item_id: ItemId, _submitted: Option<TermId>) -> Result<(), EngineError> {
        Ok(())
    }

    /// A term was deleted. Returns how many items were cleaned up.
    fn on_term_deleted(&self, _term_id: TermId, _taxonomy: &str) -> Result<usize, EngineError> {
        Ok(0)
    }

    /// Rewrite rules are being rebuilt; returns the rule list to keep.
    fn on_rewrite_rules(&self, existing: Vec<RouteRule>) -> Vec<RouteRule> {
        existing
    }
}

/// Listener registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    InvalidListenerId(String),
    DuplicateListenerId(String),
}

impl Display for HookError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidListenerId(value) => write!(f, "listener id is invalid: `{value}`"),
            Self::DuplicateListenerId(value) => {
                write!(f, "listener id already registered: {value}")
            }
        }
    }
}

impl Error for HookError {}

/// Ordered listener registry driven by the host.
#[derive(Default)]
pub struct HookRegistry<'a> {
    listeners: Vec<(String, Box<dyn LifecycleListener + 'a>)>,
}

impl<'a> HookRegistry<'a> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Registers one listener under a unique id.
    pub fn register(
        &mut self,
        id: &str,
        listener: Box<dyn LifecycleListener + 'a>,
    ) -> Result<(), HookError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(HookError::InvalidListenerId(id.to_string()));
        }
        if self.listeners.iter().any(|(existing, _)| existing == id) {
            return Err(HookError::DuplicateListenerId(id.to_string()));
        }
        self.listeners.push((id.to_string(), listener));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Listener ids in invocation order.
    pub fn listener_ids(&self) -> Vec<&str> {
        self.listeners.iter().map(|(id, _)| id.as_str()).collect()
    }

    /// Notifies every listener; stops at the first error.
    pub fn item_saved(&self, item_id: ItemId, submitted: Option<TermId>) -> Result<(), EngineError> {
        for (id, listener) in &self.listeners {
            listener.on_item_saved(item_id, submitted).map_err(|err| {
                warn!("event=hook_item_saved module=lifecycle status=error listener={id} item_id={item_id} error={err}");
                err
            })?;
        }
        Ok(())
    }

    /// Notifies every listener; stops at the first error and returns the
    /// summed cleanup count.
    pub fn term_deleted(&self, term_id: TermId, taxonomy: &str) -> Result<usize, EngineError> {
        let mut total = 0;
        for (id, listener) in &self.listeners {
            total += listener.on_term_deleted(term_id, taxonomy).map_err(|err| {
                warn!("event=hook_term_deleted module=lifecycle status=error listener={id} term_id={term_id} taxonomy={taxonomy} error={err}");
                err
            })?;
        }
        Ok(total)
    }

    /// Threads the rule list through every listener in order.
    pub fn rewrite_rules(&self, existing: Vec<RouteRule>) -> Vec<RouteRule> {
        self.listeners
            .iter()
            .fold(existing, |rules, (_, listener)| listener.on_rewrite_rules(rules))
    }
}

/// Primary-category engine over one config and one set of host stores.
pub struct PrimaryCategoryEngine<'a> {
    config: &'a RewriteConfig,
    stores: HostStores<'a>,
    resolver: PrimaryCategoryResolver<'a>,
}

impl<'a> PrimaryCategoryEngine<'a> {
    pub fn new(config: &'a RewriteConfig, stores: HostStores<'a>) -> Self {
        Self {
            config,
            stores,
            resolver: PrimaryCategoryResolver::new(config, stores),
        }
    }

    pub fn config(&self) -> &'a RewriteConfig {
        self.config
    }

    pub fn stores(&self) -> HostStores<'a> {
        self.stores
    }

    pub fn resolver(&self) -> &PrimaryCategoryResolver<'a> {
        &self.resolver
    }

    pub fn permalinks(&self) -> PermalinkRewriter<'_, 'a> {
        PermalinkRewriter::new(&self.resolver)
    }

    /// Canonical public path of `item`.
    pub fn build_path(&self, item: &ContentItem) -> String {
        self.permalinks().build_path(item)
    }

    /// Compiled table with generated rules ahead of `existing`.
    pub fn route_table(&self, existing: Vec<RouteRule>) -> Result<RouteTable, RouteError> {
        RouteTable::build(self.config, existing)
    }

    /// Routes a request path through `table` against this engine's stores.
    pub fn dispatch(
        &self,
        table: &RouteTable,
        path: &str,
    ) -> Result<Option<Dispatched>, EngineError> {
        table.dispatch(path, self.stores.items, self.stores.terms)
    }
}

impl LifecycleListener for PrimaryCategoryEngine<'_> {
    /// Drops the cached resolution (assignments may have changed) and applies
    /// the submitted choice; `None` clears the selection.
    fn on_item_saved(&self, item_id: ItemId, submitted: Option<TermId>) -> Result<(), EngineError> {
        self.resolver.invalidate(item_id)?;
        self.resolver.set_selection(item_id, submitted)
    }

    /// Clears every selection of the deleted term and invalidates the cached
    /// resolution of each affected item. Invalidation continues past a
    /// failing item; the first error is returned. Cached fallbacks naming the
    /// term are discarded by the resolver on their next read.
    fn on_term_deleted(&self, term_id: TermId, taxonomy: &str) -> Result<usize, EngineError> {
        if !self.config.primary_taxonomies().contains(taxonomy) {
            return Ok(0);
        }

        let selections = self.resolver.selections();
        let affected = selections.items_selecting(term_id)?;
        let removed = selections.clear_term(term_id)?;
        let mut first_error = None;
        for item_id in &affected {
            if let Err(err) = self.resolver.invalidate(*item_id) {
                error!(
                    "event=term_delete_invalidate module=lifecycle status=error item_id={} term_id={} error={}",
                    item_id, term_id, err
                );
                first_error.get_or_insert(err);
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        info!(
            "event=term_delete_cleanup module=lifecycle status=ok term_id={} taxonomy={} items={} removed={}",
            term_id,
            taxonomy,
            affected.len(),
            removed
        );
        Ok(affected.len())
    }

    fn on_rewrite_rules(&self, existing: Vec<RouteRule>) -> Vec<RouteRule> {
        let generated = generate_rules(self.config);
        info!(
            "event=rewrite_rules module=lifecycle status=ok generated={} existing={}",
            generated.len(),
            existing.len()
        );
        merge_ahead(generated, existing)
    }
}
