//! Content item model.
//!
//! # Responsibility
//! - Describe the host-owned content record the engine reads.
//!
//! # Invariants
//! - `id` is stable and opaque to the engine.
//! - `slug` is URL-safe and never contains `/`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque host identifier for one content item.
pub type ItemId = Uuid;

/// Type tag used when the host does not register a custom type.
pub const DEFAULT_CONTENT_TYPE: &str = "post";

/// Host content record as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ItemId,
    /// Host-registered type tag, e.g. `post` or `event`.
    pub content_type: String,
    /// URL name fragment (`post_name` on most hosts).
    pub slug: String,
}

impl ContentItem {
    /// Creates an item of the default content type with a generated id.
    pub fn new_post(slug: impl Into<String>) -> Self {
        Self::new(DEFAULT_CONTENT_TYPE, slug)
    }

    /// Creates an item with a generated id.
    pub fn new(content_type: impl Into<String>, slug: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), content_type, slug)
    }

    /// Creates an item with a caller-provided id.
    ///
    /// Used by host adapters where identity already exists externally.
    pub fn with_id(id: ItemId, content_type: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id,
            content_type: content_type.into(),
            slug: slug.into(),
        }
    }

    pub fn is_default_type(&self) -> bool {
        self.content_type == DEFAULT_CONTENT_TYPE
    }
}

#[cfg(test)]
mod tests {
    use super::{ContentItem, DEFAULT_CONTENT_TYPE};

    #[test]
    fn new_post_uses_default_type() {
        let item = ContentItem::new_post("hello-world");
        assert_eq!(item.content_type, DEFAULT_CONTENT_TYPE);
        assert!(item.is_default_type());
    }

    #[test]
    fn custom_type_is_not_default() {
        let item = ContentItem::new("event", "summer-fest");
        assert!(!item.is_default_type());
    }
}
