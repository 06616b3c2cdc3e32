//! Domain model for primary-category resolution and URL rewriting.
//!
//! # Responsibility
//! - Define the records shared by stores, resolver, rewriter and router.
//! - Keep host identity types (`ItemId`, `TermId`) explicit in signatures.
//!
//! # Invariants
//! - A content item has exactly one type tag; `post` is the default type.
//! - A stored selection is only meaningful while its term is assigned.

pub mod content;
pub mod primary;
pub mod route;
pub mod term;
