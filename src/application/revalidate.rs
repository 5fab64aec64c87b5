//! Revalidation webhook: full-site rebuild or path-scoped invalidation.

use std::sync::Arc;

use axum::http::StatusCode;
use hollow_api_types::{FailedPath, PathsRevalidatedResponse, RebuildResponse};
use metrics::counter;
use serde_json::Value;
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::application::error::HttpError;
use crate::cache::{CacheError, CacheTag, ContentCache};
use crate::domain::paths::{normalize_path, tag_path};

const SOURCE: &str = "application::revalidate::Revalidator";

#[derive(Debug, Error)]
pub enum RevalidateError {
    #[error("invalid revalidation secret")]
    Unauthorized,
    #[error("request names neither a rebuild action nor a path list")]
    MissingMode,
    #[error("root tag invalidation failed")]
    RebuildFailed(#[source] CacheError),
}

impl From<RevalidateError> for HttpError {
    fn from(error: RevalidateError) -> Self {
        match &error {
            RevalidateError::Unauthorized => HttpError::from_error(
                SOURCE,
                StatusCode::UNAUTHORIZED,
                "Invalid secret",
                &error,
            ),
            RevalidateError::MissingMode => HttpError::from_error(
                SOURCE,
                StatusCode::BAD_REQUEST,
                "Either action=\"rebuild\" or paths array is required",
                &error,
            ),
            RevalidateError::RebuildFailed(cause) => HttpError::new(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to rebuild site",
                cause.to_string(),
            )
            .with_details(),
        }
    }
}

/// Which mode a webhook call resolved to, with its response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevalidateOutcome {
    Rebuilt(RebuildResponse),
    Paths(PathsRevalidatedResponse),
}

enum Mode<'a> {
    Rebuild,
    Paths(&'a [Value]),
}

impl<'a> Mode<'a> {
    /// `action: "rebuild"` wins over a path list.
    fn of(request: &'a Value) -> Option<Self> {
        if request.get("action").and_then(Value::as_str) == Some("rebuild") {
            return Some(Self::Rebuild);
        }
        match request.get("paths").and_then(Value::as_array) {
            Some(entries) if !entries.is_empty() => Some(Self::Paths(entries)),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct Revalidator {
    cache: Arc<ContentCache>,
    secret: Option<String>,
}

impl Revalidator {
    pub fn new(cache: Arc<ContentCache>, secret: Option<String>) -> Self {
        Self {
            cache,
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    /// Authenticate and dispatch a raw webhook body.
    ///
    /// A body naming neither a secret nor a mode is malformed. Anything that
    /// carries a secret or a mode is authenticated before it is inspected.
    pub async fn handle(&self, body: &[u8]) -> Result<RevalidateOutcome, RevalidateError> {
        let request = serde_json::from_slice::<Value>(body).unwrap_or(Value::Null);
        let secret = request.get("secret");
        let mode = Mode::of(&request);
        if secret.is_none() && mode.is_none() {
            return Err(RevalidateError::MissingMode);
        }
        self.authorize(secret.and_then(Value::as_str))?;

        match mode {
            Some(Mode::Rebuild) => self.rebuild().await.map(RevalidateOutcome::Rebuilt),
            Some(Mode::Paths(entries)) => Ok(RevalidateOutcome::Paths(
                self.revalidate_paths(entries).await,
            )),
            None => Err(RevalidateError::MissingMode),
        }
    }

    /// Fails closed when no secret is configured.
    pub fn authorize(&self, provided: Option<&str>) -> Result<(), RevalidateError> {
        let (Some(expected), Some(provided)) = (self.secret.as_deref(), provided) else {
            return Err(RevalidateError::Unauthorized);
        };
        if bool::from(expected.as_bytes().ct_eq(provided.as_bytes())) {
            Ok(())
        } else {
            Err(RevalidateError::Unauthorized)
        }
    }

    /// Invalidate the root tag, dropping every cached page and the search index.
    pub async fn rebuild(&self) -> Result<RebuildResponse, RevalidateError> {
        let removed = self
            .cache
            .invalidate_tag(&CacheTag::root())
            .await
            .map_err(RevalidateError::RebuildFailed)?;
        info!(target = SOURCE, removed, "site rebuild requested");
        Ok(RebuildResponse {
            rebuilt: true,
            timestamp: OffsetDateTime::now_utc(),
        })
    }

    /// Invalidate each path in order, collecting failures instead of stopping.
    pub async fn revalidate_paths(&self, entries: &[Value]) -> PathsRevalidatedResponse {
        let mut paths = Vec::with_capacity(entries.len());
        let mut failed = Vec::new();

        for entry in entries {
            match self.revalidate_entry(entry).await {
                Ok(path) => paths.push(path),
                Err(failure) => {
                    counter!("hollow_revalidate_path_failures_total").increment(1);
                    warn!(
                        target = SOURCE,
                        path = %failure.path,
                        error = %failure.error,
                        "path revalidation failed"
                    );
                    failed.push(failure);
                }
            }
        }

        info!(
            target = SOURCE,
            revalidated = paths.len(),
            failed = failed.len(),
            "paths revalidated"
        );
        PathsRevalidatedResponse {
            revalidated: true,
            paths,
            failed,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    async fn revalidate_entry(&self, entry: &Value) -> Result<String, FailedPath> {
        let Some(raw) = entry.as_str() else {
            return Err(FailedPath {
                path: entry.to_string(),
                error: "path must be a string".to_string(),
            });
        };
        let fail = |error: String| FailedPath {
            path: raw.to_string(),
            error,
        };

        let normalized = normalize_path(raw).map_err(|err| fail(err.to_string()))?;
        self.cache
            .invalidate_tag(&CacheTag::path(tag_path(&normalized)))
            .await
            .map_err(|err| fail(err.to_string()))?;
        Ok(raw.to_string())
    }
}
