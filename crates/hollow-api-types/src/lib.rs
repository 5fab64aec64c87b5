//! Wire types shared by the hollow server and `hollow_cli`.
//!
//! Every JSON body the server emits on its operational endpoints (revalidation
//! webhook, search index, health, newsletter) is defined here so the CLI and
//! integration tests decode exactly what the server encodes.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Action value accepted by the revalidation webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevalidateAction {
    Rebuild,
}

/// Body of `POST /revalidate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevalidateRequest {
    pub secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<RevalidateAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<String>>,
}

impl RevalidateRequest {
    pub fn rebuild(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            action: Some(RevalidateAction::Rebuild),
            paths: None,
        }
    }

    pub fn paths(secret: impl Into<String>, paths: Vec<String>) -> Self {
        Self {
            secret: secret.into(),
            action: None,
            paths: Some(paths),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildResponse {
    pub rebuilt: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// One path the webhook could not invalidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedPath {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsRevalidatedResponse {
    pub revalidated: bool,
    pub paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<FailedPath>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Structured error body used by every JSON endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// A single document in the search index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub id: serde_json::Value,
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Body of `GET /search-index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchIndexPayload {
    pub posts: Vec<SearchDocument>,
    pub version: String,
    pub generated: String,
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchIndexPayload {
    /// Empty but well-formed payload served when the upstream index is unusable.
    pub fn degraded(generated: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            posts: Vec::new(),
            version: "0".to_string(),
            generated: generated.into(),
            total: 0,
            error: Some(error.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsletterRequest {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsletterResponse {
    pub success: bool,
}
