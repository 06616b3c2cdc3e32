//! Resolved primary-category records and fallback policy.
//!
//! # Responsibility
//! - Define the cached resolution value and its provenance.
//! - Name the fallback order used by resolution and by permalink building.
//!
//! # Invariants
//! - `ResolvedPrimary` always refers to a term that was assigned when it was
//!   computed; later drift is bounded by cache invalidation and TTL.
//! - Selection is active only with at least `MIN_ACTIVE_TERMS` assigned terms.

use crate::model::term::{Term, TermId};
use serde::{Deserialize, Serialize};

/// Assigned-term count from which an explicit selection is honored.
pub const MIN_ACTIVE_TERMS: usize = 2;

/// Term picked by resolution when no valid selection exists.
pub const ASSIGNMENT_FALLBACK: FallbackOrder = FallbackOrder::First;

/// Term substituted into custom-type permalinks when resolution yields none.
///
/// Differs from `ASSIGNMENT_FALLBACK`; see DESIGN.md for the decision record.
pub const PERMALINK_FALLBACK: FallbackOrder = FallbackOrder::Last;

/// Which end of the store-ordered assignment list a fallback picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackOrder {
    First,
    Last,
}

impl FallbackOrder {
    /// Picks one term from a store-ordered list.
    pub fn pick<'a>(self, terms: &'a [Term]) -> Option<&'a Term> {
        match self {
            Self::First => terms.first(),
            Self::Last => terms.last(),
        }
    }
}

/// How a resolution was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// A stored, still-assigned selection on an active item.
    Selected,
    /// No usable selection; picked by `ASSIGNMENT_FALLBACK`.
    Fallback,
}

/// Effective primary term for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPrimary {
    pub term_id: TermId,
    pub name: String,
    pub slug: String,
    pub source: ResolutionSource,
}

impl ResolvedPrimary {
    pub fn from_term(term: &Term, source: ResolutionSource) -> Self {
        Self {
            term_id: term.id,
            name: term.name.clone(),
            slug: term.slug.clone(),
            source,
        }
    }
}

/// Editor-facing selection state for one item. Data only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOptions {
    /// Primary-capable taxonomy of the item's type.
    pub taxonomy: String,
    /// Assigned terms in store order, flagged when currently selected.
    pub terms: Vec<SelectionOption>,
    /// Whether an explicit selection is honored for this item.
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOption {
    pub term: Term,
    pub selected: bool,
}
