//! Engine error taxonomy.

use crate::model::content::ItemId;
use crate::model::term::TermId;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// What a `NotFound` error refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundTarget {
    Item(ItemId),
    Term(TermId),
    Taxonomy(String),
}

impl Display for NotFoundTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Item(id) => write!(f, "content item {id}"),
            Self::Term(id) => write!(f, "term {id}"),
            Self::Taxonomy(name) => write!(f, "taxonomy {name}"),
        }
    }
}

/// Error returned by resolver, lifecycle and dispatch APIs.
#[derive(Debug)]
pub enum EngineError {
    /// Candidate term is not assigned to the item; prior selection kept.
    Validation { item_id: ItemId, term_id: TermId },
    /// Item, term or taxonomy absent.
    NotFound(NotFoundTarget),
    /// Underlying store failure. Not retried.
    Storage(RepoError),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { item_id, term_id } => write!(
                f,
                "term {term_id} is not assigned to item {item_id} in its primary taxonomy"
            ),
            Self::NotFound(target) => write!(f, "{target} not found"),
            Self::Storage(err) => write!(f, "storage error: {err}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for EngineError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ItemNotFound(id) => Self::NotFound(NotFoundTarget::Item(id)),
            RepoError::TermNotFound(id) => Self::NotFound(NotFoundTarget::Term(id)),
            RepoError::TaxonomyNotFound(name) => Self::NotFound(NotFoundTarget::Taxonomy(name)),
            other => Self::Storage(other),
        }
    }
}
