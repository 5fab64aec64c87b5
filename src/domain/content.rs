//! Normalized content records fetched from the CMS.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Fallback revalidate window applied when a record carries no setting.
pub const DEFAULT_REVALIDATE_SECS: u64 = 3600;

/// Content types the CMS serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Page,
    Post,
    Category,
    Author,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Post => "post",
            Self::Category => "category",
            Self::Author => "author",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "page" => Some(Self::Page),
            "post" => Some(Self::Post),
            "category" => Some(Self::Category),
            "author" => Some(Self::Author),
            _ => None,
        }
    }

    /// Public path a record of this kind is served under.
    pub fn public_path(self, slug: &str) -> String {
        let slug = slug.trim_matches('/');
        match self {
            Self::Page if slug.is_empty() => "/".to_string(),
            Self::Page => format!("/{slug}"),
            Self::Post => format!("/blog/{slug}"),
            Self::Category => format!("/category/{slug}"),
            Self::Author => format!("/author/{slug}"),
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Revalidation directive authored per content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "seconds", rename_all = "lowercase")]
pub enum Revalidate {
    /// Refresh after this many seconds.
    After(u64),
    /// Only the webhook refreshes this record.
    Never,
}

impl Revalidate {
    /// Resolve the CMS `revalidate` setting.
    ///
    /// A positive integer is a TTL in seconds, `false` or `0` disables
    /// time-based refresh, and anything else falls back to `fallback_secs`.
    pub fn from_setting(setting: Option<&serde_json::Value>, fallback_secs: u64) -> Self {
        use serde_json::Value;

        match setting {
            Some(Value::Bool(false)) => Self::Never,
            Some(Value::Number(n)) => match n.as_u64() {
                Some(0) => Self::Never,
                Some(secs) => Self::After(secs),
                None => Self::After(fallback_secs),
            },
            Some(Value::String(s)) => match s.trim().parse::<u64>() {
                Ok(0) => Self::Never,
                Ok(secs) => Self::After(secs),
                Err(_) => Self::After(fallback_secs),
            },
            _ => Self::After(fallback_secs),
        }
    }

    /// Effective time-to-live, `None` when the entry never expires on its own.
    pub fn ttl(self) -> Option<Duration> {
        match self {
            Self::After(secs) => Some(Duration::from_secs(secs)),
            Self::Never => None,
        }
    }
}

impl Default for Revalidate {
    fn default() -> Self {
        Self::After(DEFAULT_REVALIDATE_SECS)
    }
}

/// A WordPress block or ACF layout row, passed through untouched for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub name: String,
    #[serde(default)]
    pub attributes: serde_json::Value,
}

/// Post teaser listed by archive records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub kind: ContentKind,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub body_html: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub seo_title: Option<String>,
    #[serde(default)]
    pub seo_description: Option<String>,
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
    #[serde(default)]
    pub posts: Vec<PostSummary>,
    pub revalidate: Revalidate,
}

impl ContentRecord {
    pub fn public_path(&self) -> String {
        self.kind.public_path(&self.slug)
    }
}
