//! Canonical permalink construction.
//!
//! # Responsibility
//! - Expand the host permalink template of an item.
//! - Rewrite it with the item's primary term slug.
//!
//! # Invariants
//! - Default-type output is `{base}/{term}/{slug}/` with exactly one trailing
//!   slash, or the host permalink untouched when nothing resolves.
//! - Custom-type output only substitutes `%{taxonomy}%`; no other
//!   normalization.
//! - Resolution failures never produce an error; a fallback path is returned.

use crate::config::{taxonomy_placeholder, RewriteConfig, POSTNAME_PLACEHOLDER};
use crate::model::content::ContentItem;
use crate::service::resolver::PrimaryCategoryResolver;
use log::{debug, error};

pub struct PermalinkRewriter<'r, 'a> {
    resolver: &'r PrimaryCategoryResolver<'a>,
}

impl<'r, 'a> PermalinkRewriter<'r, 'a> {
    pub fn new(resolver: &'r PrimaryCategoryResolver<'a>) -> Self {
        Self { resolver }
    }

    /// Canonical public path of `item`.
    pub fn build_path(&self, item: &ContentItem) -> String {
        let host_permalink = self.host_permalink(item);
        self.rewrite(item, &host_permalink)
    }

    /// Host-default permalink: the type template with `%postname%` expanded,
    /// joined to the site base URL.
    pub fn host_permalink(&self, item: &ContentItem) -> String {
        let config = self.config();
        let template = config
            .permalink_template(&item.content_type)
            .replace(POSTNAME_PLACEHOLDER, &item.slug);
        if template.starts_with('/') {
            format!("{}{template}", config.site_base_url)
        } else {
            format!("{}/{template}", config.site_base_url)
        }
    }

    /// Rewrites a host-generated permalink for `item`.
    pub fn rewrite(&self, item: &ContentItem, host_permalink: &str) -> String {
        let resolved = match self.resolver.resolve_item(item) {
            Ok(resolved) => resolved,
            Err(err) => {
                error!(
                    "event=permalink_resolve module=permalink status=degraded item_id={} error={}",
                    item.id, err
                );
                None
            }
        };

        if item.is_default_type() {
            return match resolved {
                Some(primary) => format!(
                    "{}/{}/{}/",
                    self.config().site_base_url,
                    primary.slug,
                    item.slug
                ),
                None => host_permalink.to_string(),
            };
        }

        let Some(taxonomy) = self.config().primary_taxonomy(&item.content_type) else {
            return host_permalink.to_string();
        };
        let slug = match resolved {
            Some(primary) => primary.slug,
            None => self.fallback_slug(item, taxonomy),
        };
        host_permalink.replace(&taxonomy_placeholder(taxonomy), &slug)
    }

    /// Slug picked by `permalink_fallback`, or empty.
    fn fallback_slug(&self, item: &ContentItem, taxonomy: &str) -> String {
        match self.resolver.terms().assigned_terms(item.id, taxonomy) {
            Ok(terms) => {
                let slug = self
                    .config()
                    .permalink_fallback
                    .pick(&terms)
                    .map(|term| term.slug.clone())
                    .unwrap_or_default();
                debug!(
                    "event=permalink_fallback module=permalink status=ok item_id={} slug={}",
                    item.id, slug
                );
                slug
            }
            Err(err) => {
                error!(
                    "event=permalink_fallback module=permalink status=error item_id={} error={}",
                    item.id, err
                );
                String::new()
            }
        }
    }

    fn config(&self) -> &'a RewriteConfig {
        self.resolver.config()
    }
}
