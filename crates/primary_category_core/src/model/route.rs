//! Route rule model.
//!
//! # Responsibility
//! - Describe `(pattern, target)` pairs handed to the host router.
//! - Render targets to the host's query-string form.
//!
//! # Invariants
//! - Capture group references are 1-based, matching `$matches[n]`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Structured destination of one route rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteTarget {
    /// Single content item selected by the slug in capture group `slug_group`.
    Item {
        content_type: String,
        slug_group: usize,
    },
    /// Term archive selected by the term slug in capture group `term_group`.
    TermArchive { taxonomy: String, term_group: usize },
    /// Pre-existing host rule kept opaque.
    Host { query: String },
}

impl Display for RouteTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Item {
                content_type,
                slug_group,
            } => write!(
                f,
                "index.php?post_type={content_type}&name=$matches[{slug_group}]"
            ),
            Self::TermArchive {
                taxonomy,
                term_group,
            } => write!(f, "index.php?{taxonomy}=$matches[{term_group}]"),
            Self::Host { query } => f.write_str(query),
        }
    }
}

/// One rule consulted by the host router, in precedence order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
    /// Regex source without the leading `^` anchor.
    pub pattern: String,
    pub target: RouteTarget,
}

impl RouteRule {
    pub fn new(pattern: impl Into<String>, target: RouteTarget) -> Self {
        Self {
            pattern: pattern.into(),
            target,
        }
    }

    /// Wraps an existing host rule.
    pub fn host(pattern: impl Into<String>, query: impl Into<String>) -> Self {
        Self::new(
            pattern,
            RouteTarget::Host {
                query: query.into(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::RouteTarget;

    #[test]
    fn item_target_renders_host_query() {
        let target = RouteTarget::Item {
            content_type: "event".to_string(),
            slug_group: 4,
        };
        assert_eq!(
            target.to_string(),
            "index.php?post_type=event&name=$matches[4]"
        );
    }

    #[test]
    fn archive_target_renders_taxonomy_query() {
        let target = RouteTarget::TermArchive {
            taxonomy: "event_category".to_string(),
            term_group: 1,
        };
        assert_eq!(target.to_string(), "index.php?event_category=$matches[1]");
    }
}
