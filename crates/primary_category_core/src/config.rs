//! Rewrite registration state, built once at startup.
//!
//! # Responsibility
//! - Capture which content types are routable and which taxonomy is
//!   primary-capable for each, plus permalink templates and policy knobs.
//! - Decode the same shape from JSON for hosts that keep it in a file.
//!
//! # Invariants
//! - The primary-capable taxonomy of a type is the first registered taxonomy
//!   the term store reports as hierarchical. No other tie-break.
//! - Excluded or non-public types have no primary-capable taxonomy.
//! - `capture_depth >= 2`.

use crate::model::content::DEFAULT_CONTENT_TYPE;
use crate::model::primary::{FallbackOrder, ASSIGNMENT_FALLBACK, PERMALINK_FALLBACK};
use crate::repo::term_repo::TermStore;
use crate::repo::RepoError;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Capture groups in the deep item rule.
pub const DEFAULT_CAPTURE_DEPTH: usize = 4;
/// The item rule always captures a term and a slug.
pub const MIN_CAPTURE_DEPTH: usize = 2;
/// Resolution cache TTL; a safety net for missed invalidations.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 24 * 60 * 60;
/// Host permalink structure for the default content type.
pub const DEFAULT_PERMALINK_STRUCTURE: &str = "/%postname%/";
/// Placeholder replaced by the item slug in permalink templates.
pub const POSTNAME_PLACEHOLDER: &str = "%postname%";
/// Built-in host types that never take part in primary-category routing.
pub const DEFAULT_EXCLUDED_TYPES: &[&str] = &[
    "page",
    "attachment",
    "revision",
    "nav_menu_item",
    "custom_css",
    "customize_changeset",
];

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid identifier regex"));

/// Config decoding or validation failure.
#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
    Invalid(String),
    Repo(RepoError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid rewrite config json: {err}"),
            Self::Invalid(message) => write!(f, "invalid rewrite config: {message}"),
            Self::Repo(err) => write!(f, "failed to inspect taxonomies: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<RepoError> for ConfigError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Host registration of one content type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContentTypeRegistration {
    pub name: String,
    #[serde(default = "default_public")]
    pub public: bool,
    /// Taxonomies attached to the type, in registration order.
    #[serde(default)]
    pub taxonomies: Vec<String>,
    /// Custom permalink template, e.g. `/event/%event_category%/%postname%/`.
    #[serde(default)]
    pub permalink_template: Option<String>,
}

impl ContentTypeRegistration {
    pub fn new<I, S>(name: impl Into<String>, taxonomies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            public: true,
            taxonomies: taxonomies.into_iter().map(Into::into).collect(),
            permalink_template: None,
        }
    }

    pub fn with_permalink_template(mut self, template: impl Into<String>) -> Self {
        self.permalink_template = Some(template.into());
        self
    }

    pub fn private(mut self) -> Self {
        self.public = false;
        self
    }
}

fn default_public() -> bool {
    true
}

/// Unvalidated config input. Build with `RewriteConfigBuilder::build`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RewriteConfigBuilder {
    site_base_url: String,
    #[serde(default)]
    permalink_structure: Option<String>,
    #[serde(default)]
    capture_depth: Option<usize>,
    #[serde(default)]
    cache_ttl_secs: Option<u64>,
    #[serde(default)]
    excluded_types: Option<Vec<String>>,
    #[serde(default)]
    assignment_fallback: Option<FallbackOrder>,
    #[serde(default)]
    permalink_fallback: Option<FallbackOrder>,
    #[serde(default)]
    content_types: Vec<ContentTypeRegistration>,
}

impl RewriteConfigBuilder {
    pub fn new(site_base_url: impl Into<String>) -> Self {
        Self {
            site_base_url: site_base_url.into(),
            permalink_structure: None,
            capture_depth: None,
            cache_ttl_secs: None,
            excluded_types: None,
            assignment_fallback: None,
            permalink_fallback: None,
            content_types: Vec::new(),
        }
    }

    /// Decodes builder input from JSON.
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn content_type(mut self, registration: ContentTypeRegistration) -> Self {
        self.content_types.push(registration);
        self
    }

    pub fn permalink_structure(mut self, structure: impl Into<String>) -> Self {
        self.permalink_structure = Some(structure.into());
        self
    }

    pub fn capture_depth(mut self, depth: usize) -> Self {
        self.capture_depth = Some(depth);
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_secs = Some(ttl.as_secs());
        self
    }

    pub fn excluded_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn assignment_fallback(mut self, order: FallbackOrder) -> Self {
        self.assignment_fallback = Some(order);
        self
    }

    pub fn permalink_fallback(mut self, order: FallbackOrder) -> Self {
        self.permalink_fallback = Some(order);
        self
    }

    /// Validates input and resolves primary-capable taxonomies.
    ///
    /// # Errors
    /// - `Invalid` for empty base URL, capture depth below 2, malformed or
    ///   duplicate type names, malformed taxonomy names.
    /// - `Repo` when the term store cannot answer `is_hierarchical`.
    pub fn build(self, terms: &dyn TermStore) -> Result<RewriteConfig, ConfigError> {
        let site_base_url = self.site_base_url.trim().trim_end_matches('/').to_string();
        if site_base_url.is_empty() {
            return Err(ConfigError::Invalid(
                "site_base_url cannot be empty".to_string(),
            ));
        }

        let capture_depth = self.capture_depth.unwrap_or(DEFAULT_CAPTURE_DEPTH);
        if capture_depth < MIN_CAPTURE_DEPTH {
            return Err(ConfigError::Invalid(format!(
                "capture_depth must be at least {MIN_CAPTURE_DEPTH} (term and slug)"
            )));
        }

        let excluded_types: BTreeSet<String> = match self.excluded_types {
            Some(types) => types.into_iter().collect(),
            None => DEFAULT_EXCLUDED_TYPES
                .iter()
                .map(|value| value.to_string())
                .collect(),
        };

        let mut seen = BTreeSet::new();
        let mut content_types = Vec::with_capacity(self.content_types.len());
        for registration in self.content_types {
            validate_identifier("content type", &registration.name)?;
            if !seen.insert(registration.name.clone()) {
                return Err(ConfigError::Invalid(format!(
                    "content type registered twice: {}",
                    registration.name
                )));
            }
            for taxonomy in &registration.taxonomies {
                validate_identifier("taxonomy", taxonomy)?;
            }

            let routable = registration.public && !excluded_types.contains(&registration.name);
            let primary_taxonomy = if routable {
                first_hierarchical(terms, &registration.taxonomies)?
            } else {
                None
            };
            debug!(
                "event=config_type module=config status=ok type={} routable={} primary_taxonomy={}",
                registration.name,
                routable,
                primary_taxonomy.as_deref().unwrap_or("-")
            );

            let permalink_template = registration
                .permalink_template
                .unwrap_or_else(|| default_template(&registration.name, primary_taxonomy.as_deref()));

            content_types.push(ContentTypeConfig {
                name: registration.name,
                routable,
                primary_taxonomy,
                permalink_template,
            });
        }

        info!(
            "event=config_build module=config status=ok types={} capture_depth={}",
            content_types.len(),
            capture_depth
        );

        Ok(RewriteConfig {
            site_base_url,
            permalink_structure: self
                .permalink_structure
                .unwrap_or_else(|| DEFAULT_PERMALINK_STRUCTURE.to_string()),
            capture_depth,
            cache_ttl: Duration::from_secs(self.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS)),
            assignment_fallback: self.assignment_fallback.unwrap_or(ASSIGNMENT_FALLBACK),
            permalink_fallback: self.permalink_fallback.unwrap_or(PERMALINK_FALLBACK),
            content_types,
        })
    }
}

/// Resolved registration of one content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypeConfig {
    pub name: String,
    /// Public and not excluded.
    pub routable: bool,
    pub primary_taxonomy: Option<String>,
    pub permalink_template: String,
}

/// Validated rewrite configuration shared by resolver, rewriter and router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteConfig {
    /// Base URL without trailing slash.
    pub site_base_url: String,
    pub permalink_structure: String,
    pub capture_depth: usize,
    pub cache_ttl: Duration,
    pub assignment_fallback: FallbackOrder,
    pub permalink_fallback: FallbackOrder,
    content_types: Vec<ContentTypeConfig>,
}

impl RewriteConfig {
    pub fn builder(site_base_url: impl Into<String>) -> RewriteConfigBuilder {
        RewriteConfigBuilder::new(site_base_url)
    }

    pub fn content_type(&self, name: &str) -> Option<&ContentTypeConfig> {
        self.content_types.iter().find(|entry| entry.name == name)
    }

    /// Registered types in registration order.
    pub fn content_types(&self) -> &[ContentTypeConfig] {
        &self.content_types
    }

    /// Primary-capable taxonomy of `content_type`, if any.
    ///
    /// Unregistered types yield `None`; this is not an error.
    pub fn primary_taxonomy(&self, content_type: &str) -> Option<&str> {
        self.content_type(content_type)
            .and_then(|entry| entry.primary_taxonomy.as_deref())
    }

    /// Distinct primary-capable taxonomies across all types.
    pub fn primary_taxonomies(&self) -> BTreeSet<&str> {
        self.content_types
            .iter()
            .filter_map(|entry| entry.primary_taxonomy.as_deref())
            .collect()
    }

    /// Permalink template for `content_type`; the default type uses the
    /// site permalink structure.
    pub fn permalink_template(&self, content_type: &str) -> String {
        if content_type == DEFAULT_CONTENT_TYPE {
            return self.permalink_structure.clone();
        }
        match self.content_type(content_type) {
            Some(entry) => entry.permalink_template.clone(),
            None => default_template(content_type, None),
        }
    }
}

/// Placeholder token for a taxonomy inside permalink templates.
pub fn taxonomy_placeholder(taxonomy: &str) -> String {
    format!("%{taxonomy}%")
}

/// Custom types default to the routable `type/taxonomy/term/slug` shape.
fn default_template(content_type: &str, taxonomy: Option<&str>) -> String {
    match taxonomy {
        Some(taxonomy) => format!(
            "/{content_type}/{taxonomy}/{}/{POSTNAME_PLACEHOLDER}/",
            taxonomy_placeholder(taxonomy)
        ),
        None => format!("/{content_type}/{POSTNAME_PLACEHOLDER}/"),
    }
}

fn first_hierarchical(
    terms: &dyn TermStore,
    taxonomies: &[String],
) -> Result<Option<String>, ConfigError> {
    for taxonomy in taxonomies {
        if terms.is_hierarchical(taxonomy)? {
            return Ok(Some(taxonomy.clone()));
        }
    }
    Ok(None)
}

fn validate_identifier(kind: &str, value: &str) -> Result<(), ConfigError> {
    if IDENTIFIER_RE.is_match(value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{kind} name `{value}` must match [A-Za-z0-9_-]+"
        )))
    }
}
