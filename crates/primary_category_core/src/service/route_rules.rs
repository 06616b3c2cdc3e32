//! Route rule generation, precedence merge and request matching.
//!
//! # Responsibility
//! - Emit two rules per routable type with a primary-capable taxonomy: a
//!   deep item rule and a term-archive rule.
//! - Place generated rules ahead of existing host rules.
//! - Match request paths first-rule-wins and resolve captures to items/terms.
//!
//! # Invariants
//! - Rules are generated per type/taxonomy pair, never per item.
//! - `merge_ahead` does not deduplicate; callers merge once per rebuild.
//! - Patterns are stored unanchored and compiled with a leading `^`.

use crate::config::RewriteConfig;
use crate::model::content::ContentItem;
use crate::model::route::{RouteRule, RouteTarget};
use crate::model::term::Term;
use crate::repo::content_repo::ContentStore;
use crate::repo::term_repo::TermStore;
use crate::service::error::EngineError;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static MATCH_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$matches\[(\d+)\]").expect("valid match reference regex"));

const SEGMENT_GROUP: &str = "([^/]+)";
const OPTIONAL_SEGMENT_GROUP: &str = "(?:/([^/]+))?";
/// Archive terms may arrive as `parent/child` paths.
const ARCHIVE_GROUP: &str = "(.+)";

/// Rule compilation failure.
#[derive(Debug)]
pub struct RouteError {
    pub pattern: String,
    pub source: regex::Error,
}

impl Display for RouteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid route pattern `{}`: {}", self.pattern, self.source)
    }
}

impl Error for RouteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Generates item and archive rules for every routable type.
///
/// The item rule captures the term, up to `capture_depth - 2` optional
/// nested segments and the item slug, always in group `capture_depth`.
/// Types without a primary-capable taxonomy produce no rules.
pub fn generate_rules(config: &RewriteConfig) -> Vec<RouteRule> {
    let mut rules = Vec::new();
    for entry in config.content_types().iter().filter(|entry| entry.routable) {
        let Some(taxonomy) = entry.primary_taxonomy.as_deref() else {
            continue;
        };
        let prefix = format!("{}/{}", regex::escape(&entry.name), regex::escape(taxonomy));

        rules.push(RouteRule::new(
            format!("{prefix}/{}/?$", item_groups(config.capture_depth)),
            RouteTarget::Item {
                content_type: entry.name.clone(),
                slug_group: config.capture_depth,
            },
        ));
        rules.push(RouteRule::new(
            format!("{prefix}/{ARCHIVE_GROUP}/?$"),
            RouteTarget::TermArchive {
                taxonomy: taxonomy.to_string(),
                term_group: 1,
            },
        ));
    }
    debug!(
        "event=rules_generate module=route_rules status=ok rules={}",
        rules.len()
    );
    rules
}

fn item_groups(depth: usize) -> String {
    let nested = depth.saturating_sub(2);
    format!(
        "{SEGMENT_GROUP}{}/{SEGMENT_GROUP}",
        OPTIONAL_SEGMENT_GROUP.repeat(nested)
    )
}

/// Places `generated` before `existing`, preserving both orders.
pub fn merge_ahead(generated: Vec<RouteRule>, existing: Vec<RouteRule>) -> Vec<RouteRule> {
    let mut merged = generated;
    merged.extend(existing);
    merged
}

/// Ordered, compiled rule list.
#[derive(Debug)]
pub struct RouteTable {
    rules: Vec<CompiledRule>,
}

#[derive(Debug)]
struct CompiledRule {
    rule: RouteRule,
    regex: Regex,
}

/// First rule matching a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'t> {
    /// Position of the rule in the table.
    pub index: usize,
    pub rule: &'t RouteRule,
    /// Capture groups; `captures[0]` is `$matches[1]`.
    pub captures: Vec<String>,
}

impl RouteMatch<'_> {
    /// Capture group `n`, 1-based.
    pub fn group(&self, n: usize) -> Option<&str> {
        n.checked_sub(1)
            .and_then(|index| self.captures.get(index))
            .map(String::as_str)
    }

    /// Host query string with `$matches[n]` references expanded.
    pub fn expand_query(&self) -> String {
        let query = self.rule.target.to_string();
        MATCH_REF_RE
            .replace_all(&query, |caps: &regex::Captures<'_>| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| self.group(n))
                    .unwrap_or_default()
                    .to_string()
            })
            .into_owned()
    }
}

/// Outcome of routing a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    Item(ContentItem),
    TermArchive(Term),
    /// A host rule matched; its query is returned expanded.
    Host { query: String },
    /// A generated rule matched but names no existing item or term.
    Unresolved { rule_index: usize },
}

impl RouteTable {
    /// Compiles `rules` in order.
    pub fn new(rules: Vec<RouteRule>) -> Result<Self, RouteError> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let regex = Regex::new(&format!("^{}", rule.pattern)).map_err(|source| RouteError {
                pattern: rule.pattern.clone(),
                source,
            })?;
            compiled.push(CompiledRule { rule, regex });
        }
        Ok(Self { rules: compiled })
    }

    /// Generates rules from `config` and merges them ahead of `existing`.
    pub fn build(config: &RewriteConfig, existing: Vec<RouteRule>) -> Result<Self, RouteError> {
        let table = Self::new(merge_ahead(generate_rules(config), existing))?;
        info!(
            "event=route_table_build module=route_rules status=ok rules={}",
            table.len()
        );
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> impl Iterator<Item = &RouteRule> {
        self.rules.iter().map(|compiled| &compiled.rule)
    }

    /// First rule matching `path`. Leading `/` and any query string are
    /// ignored.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch<'_>> {
        let normalized = normalize_request_path(path);
        self.rules
            .iter()
            .enumerate()
            .find_map(|(index, compiled)| {
                let caps = compiled.regex.captures(normalized)?;
                let captures = caps
                    .iter()
                    .skip(1)
                    .map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
                    .collect();
                Some(RouteMatch {
                    index,
                    rule: &compiled.rule,
                    captures,
                })
            })
    }

    /// Routes `path` to an item, a term archive or a host rule.
    ///
    /// Returns `None` when no rule matches.
    pub fn dispatch(
        &self,
        path: &str,
        items: &dyn ContentStore,
        terms: &dyn TermStore,
    ) -> Result<Option<Dispatched>, EngineError> {
        let Some(matched) = self.match_path(path) else {
            debug!("event=dispatch module=route_rules status=no_match path={path}");
            return Ok(None);
        };

        let dispatched = match &matched.rule.target {
            RouteTarget::Item {
                content_type,
                slug_group,
            } => {
                let slug = matched.group(*slug_group).map(last_segment).unwrap_or("");
                items
                    .find_by_slug(content_type, slug)?
                    .map(Dispatched::Item)
            }
            RouteTarget::TermArchive {
                taxonomy,
                term_group,
            } => {
                let slug = matched.group(*term_group).map(last_segment).unwrap_or("");
                terms
                    .get_term_by_slug(slug, taxonomy)?
                    .map(Dispatched::TermArchive)
            }
            RouteTarget::Host { .. } => Some(Dispatched::Host {
                query: matched.expand_query(),
            }),
        };

        let dispatched = dispatched.unwrap_or(Dispatched::Unresolved {
            rule_index: matched.index,
        });
        debug!(
            "event=dispatch module=route_rules status=ok path={} rule_index={}",
            path, matched.index
        );
        Ok(Some(dispatched))
    }
}

fn normalize_request_path(path: &str) -> &str {
    let without_query = path.split(['?', '#']).next().unwrap_or_default();
    without_query.trim_start_matches('/')
}

/// `(.+)` archive captures may span several segments or keep a trailing slash.
fn last_segment(capture: &str) -> &str {
    capture
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}
