//! Host collaborator contracts and reference persistence implementations.
//!
//! # Responsibility
//! - Define the store traits the engine depends on: content, terms, item
//!   metadata and ephemeral cache values.
//! - Provide SQLite implementations used by tests and the CLI.
//!
//! # Invariants
//! - Store APIs return semantic errors (`ItemNotFound`, `TermNotFound`) in
//!   addition to DB transport errors.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::content::ItemId;
use crate::model::term::TermId;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod content_repo;
pub mod meta_repo;
pub mod term_repo;
pub mod transient_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Store error shared by every collaborator implementation.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    ItemNotFound(ItemId),
    TermNotFound(TermId),
    TaxonomyNotFound(String),
    InvalidData(String),
    LockPoisoned(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::ItemNotFound(id) => write!(f, "content item not found: {id}"),
            Self::TermNotFound(id) => write!(f, "term not found: {id}"),
            Self::TaxonomyNotFound(name) => write!(f, "taxonomy not found: {name}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::LockPoisoned(store) => write!(f, "{store} lock poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn parse_item_id(value: &str, column: &str) -> RepoResult<ItemId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
