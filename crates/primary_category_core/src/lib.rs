//! Primary-category resolution and URL-rewrite engine.
//!
//! Lets an editor designate one term as an item's primary category, rewrites
//! the item's permalink with that term, and generates/matches the route rules
//! that bring requests of that shape back to the item.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, ContentTypeRegistration, RewriteConfig, RewriteConfigBuilder};
pub use logging::{default_level, init_logging, LogSettings, LoggingError};
pub use model::content::{ContentItem, ItemId, DEFAULT_CONTENT_TYPE};
pub use model::primary::{
    FallbackOrder, ResolutionSource, ResolvedPrimary, SelectionOption, SelectionOptions,
    ASSIGNMENT_FALLBACK, PERMALINK_FALLBACK,
};
pub use model::route::{RouteRule, RouteTarget};
pub use model::term::{Taxonomy, Term, TermId};
pub use repo::content_repo::{ContentStore, SqliteContentStore};
pub use repo::meta_repo::{MetaStore, SqliteMetaStore};
pub use repo::term_repo::{SqliteTermStore, TermStore};
pub use repo::transient_repo::{CacheKey, EphemeralStore, MemoryTransientStore, SqliteTransientStore};
pub use repo::{RepoError, RepoResult};
pub use service::error::{EngineError, NotFoundTarget};
pub use service::lifecycle::{HookError, HookRegistry, LifecycleListener, PrimaryCategoryEngine};
pub use service::permalink::PermalinkRewriter;
pub use service::resolution_cache::ResolutionCache;
pub use service::resolver::PrimaryCategoryResolver;
pub use service::route_rules::{
    generate_rules, merge_ahead, Dispatched, RouteError, RouteMatch, RouteTable,
};
pub use service::selection_store::{SelectionStore, PRIMARY_CATEGORY_META_KEY};
pub use service::HostStores;

/// Minimal health-check API for host integration checks.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
