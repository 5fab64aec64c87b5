//! Cache key and tag definitions.
//!
//! Keys and tags are plain strings so any store (in-memory, Redis, a CDN tag
//! API) can hold them; the constructors here are the only place their shape
//! is decided.

use std::fmt;

use crate::domain::content::ContentKind;

/// Tag carried by every site entry; invalidating it clears the whole site.
pub const ROOT_TAG: &str = "site";
/// Key and tag of the search-index entry.
pub const SEARCH_INDEX: &str = "search-index";

/// Identifies one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn content(kind: ContentKind, slug: &str) -> Self {
        Self(format!("{}:{}", kind.as_str(), slug.trim_matches('/')))
    }

    pub fn blog_page(page: u32, page_size: u32) -> Self {
        Self(format!("blog:page:{page}:size:{page_size}"))
    }

    pub fn search_index() -> Self {
        Self(SEARCH_INDEX.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Invalidation tag attached to cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheTag(String);

impl CacheTag {
    pub fn root() -> Self {
        Self(ROOT_TAG.to_string())
    }

    pub fn kind(kind: ContentKind) -> Self {
        Self(kind.as_str().to_string())
    }

    pub fn content(kind: ContentKind, slug: &str) -> Self {
        Self(format!("{}:{}", kind.as_str(), slug.trim_matches('/')))
    }

    /// Tag for a normalized public path (see [`crate::domain::paths::normalize_path`]).
    pub fn path(path: &str) -> Self {
        Self(format!("path:{path}"))
    }

    pub fn search_index() -> Self {
        Self(SEARCH_INDEX.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Standard tag set for a single content record served at `path`.
pub fn content_tags(kind: ContentKind, slug: &str, path: &str) -> Vec<CacheTag> {
    vec![
        CacheTag::root(),
        CacheTag::kind(kind),
        CacheTag::content(kind, slug),
        CacheTag::path(path),
    ]
}
