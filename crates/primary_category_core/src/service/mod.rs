//! Primary-category use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into resolution, permalink and routing APIs.
//! - Keep host adapters decoupled from storage details.
//!
//! # See also
//! - DESIGN.md

use crate::repo::content_repo::ContentStore;
use crate::repo::meta_repo::MetaStore;
use crate::repo::term_repo::TermStore;
use crate::repo::transient_repo::EphemeralStore;

pub mod error;
pub mod lifecycle;
pub mod permalink;
pub mod resolution_cache;
pub mod resolver;
pub mod route_rules;
pub mod selection_store;

/// Host collaborators consumed by the engine.
#[derive(Clone, Copy)]
pub struct HostStores<'a> {
    pub items: &'a dyn ContentStore,
    pub terms: &'a dyn TermStore,
    pub meta: &'a dyn MetaStore,
    pub cache: &'a dyn EphemeralStore,
}
