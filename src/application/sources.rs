//! Traits describing the upstream services the application talks to.

use async_trait::async_trait;
use hollow_api_types::SearchIndexPayload;
use thiserror::Error;

use crate::domain::content::{ContentKind, ContentRecord};

/// Transient upstream failure. `Clone` so one failed fetch can be handed to
/// every caller that was waiting on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("upstream request timed out")]
    Timeout,
    #[error("upstream responded with status {0}")]
    Status(u16),
    #[error("upstream returned errors: {0}")]
    Upstream(String),
    #[error("upstream payload could not be decoded: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Read access to CMS content. `Ok(None)` means the content does not exist.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_by_slug(
        &self,
        kind: ContentKind,
        slug: &str,
        preview: bool,
    ) -> Result<Option<ContentRecord>, FetchError>;

    /// Posts for a 1-based blog index page, newest first.
    async fn fetch_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<Vec<ContentRecord>, FetchError>;

    async fn count_all(&self, kind: ContentKind) -> Result<u64, FetchError>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchIndexError {
    /// The endpoint does not exist upstream; the feature is not enabled.
    #[error("search index endpoint not found")]
    NotFound,
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[async_trait]
pub trait SearchIndexSource: Send + Sync {
    async fn fetch_index(&self) -> Result<SearchIndexPayload, SearchIndexError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail provider is not configured")]
    NotConfigured,
    #[error("mail provider rejected the message: {0}")]
    Rejected(String),
    #[error("mail provider request failed: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError>;
}
