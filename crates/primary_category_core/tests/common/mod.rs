#![allow(dead_code)]

use primary_category_core::{
    ContentItem, ContentTypeRegistration, HostStores, ItemId, RewriteConfig, SqliteContentStore,
    SqliteMetaStore, SqliteTermStore, SqliteTransientStore, Taxonomy, TermId,
};
use rusqlite::Connection;

pub const BASE_URL: &str = "https://example.com";

/// Reference host over one SQLite connection.
pub struct Host<'c> {
    pub items: SqliteContentStore<'c>,
    pub terms: SqliteTermStore<'c>,
    pub meta: SqliteMetaStore<'c>,
    pub cache: SqliteTransientStore<'c>,
}

impl<'c> Host<'c> {
    /// Registers `category`/`post_tag` for posts and
    /// `event_category`/`event_tag` for events.
    pub fn seeded(conn: &'c Connection) -> Self {
        let host = Self {
            items: SqliteContentStore::new(conn),
            terms: SqliteTermStore::new(conn),
            meta: SqliteMetaStore::new(conn),
            cache: SqliteTransientStore::new(conn),
        };
        for (name, hierarchical) in [
            ("category", true),
            ("post_tag", false),
            ("event_category", true),
            ("event_tag", false),
        ] {
            host.terms
                .upsert_taxonomy(&Taxonomy::new(name, hierarchical))
                .unwrap();
        }
        host
    }

    pub fn stores(&self) -> HostStores<'_> {
        HostStores {
            items: &self.items,
            terms: &self.terms,
            meta: &self.meta,
            cache: &self.cache,
        }
    }

    /// Posts, events and pages; non-hierarchical taxonomies listed first.
    pub fn config(&self) -> RewriteConfig {
        RewriteConfig::builder(BASE_URL)
            .content_type(ContentTypeRegistration::new("post", ["post_tag", "category"]))
            .content_type(ContentTypeRegistration::new(
                "event",
                ["event_tag", "event_category"],
            ))
            .content_type(ContentTypeRegistration::new("page", ["category"]))
            .build(&self.terms)
            .unwrap()
    }

    pub fn term(&self, id: TermId, taxonomy: &str, slug: &str, name: &str) -> TermId {
        self.terms
            .create_term_with_id(id, taxonomy, slug, name)
            .unwrap()
    }

    pub fn item(&self, content_type: &str, slug: &str) -> ContentItem {
        let item = ContentItem::new(content_type, slug);
        self.items.create_item(&item).unwrap();
        item
    }

    pub fn assign(&self, item_id: ItemId, taxonomy: &str, term_ids: &[TermId]) {
        self.terms
            .set_item_terms(item_id, taxonomy, term_ids)
            .unwrap();
    }
}
