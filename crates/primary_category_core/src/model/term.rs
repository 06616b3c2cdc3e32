//! Taxonomy and term model.

use serde::{Deserialize, Serialize};

/// Host identifier for one taxonomy term.
pub type TermId = i64;

/// Host taxonomy registration.
///
/// Only hierarchical taxonomies may carry a primary category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub name: String,
    pub hierarchical: bool,
}

impl Taxonomy {
    pub fn new(name: impl Into<String>, hierarchical: bool) -> Self {
        Self {
            name: name.into(),
            hierarchical,
        }
    }
}

/// One term inside a taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: TermId,
    pub taxonomy: String,
    /// URL fragment substituted into permalinks.
    pub slug: String,
    /// Display name shown to editors.
    pub name: String,
}
