//! Draft preview mode.

use axum::http::StatusCode;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::application::error::HttpError;
use crate::domain::content::ContentKind;
use crate::domain::paths::is_local_redirect;

const SOURCE: &str = "application::preview::PreviewService";

/// Cookie flag marking a browser as being in preview mode.
pub const PREVIEW_COOKIE: &str = "hollow_preview";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreviewError {
    #[error("invalid preview secret")]
    Unauthorized,
    #[error("preview requires a slug")]
    MissingSlug,
    #[error("slug `{0:?}` contains whitespace or control characters")]
    InvalidSlug(String),
    #[error("unknown content kind `{0}`")]
    UnknownKind(String),
}

impl From<PreviewError> for HttpError {
    fn from(error: PreviewError) -> Self {
        let (status, message) = match error {
            PreviewError::Unauthorized => (StatusCode::UNAUTHORIZED, "Invalid token"),
            PreviewError::MissingSlug => (StatusCode::BAD_REQUEST, "Missing slug"),
            PreviewError::InvalidSlug(_) => (StatusCode::BAD_REQUEST, "Invalid slug"),
            PreviewError::UnknownKind(_) => (StatusCode::BAD_REQUEST, "Unknown content kind"),
        };
        HttpError::from_error(SOURCE, status, message, &error)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PreviewService {
    secret: Option<String>,
}

impl PreviewService {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    /// Validate a preview request and return the public path to land on.
    pub fn enter(
        &self,
        secret: Option<&str>,
        slug: Option<&str>,
        kind: Option<&str>,
    ) -> Result<String, PreviewError> {
        let authorized = match (self.secret.as_deref(), secret) {
            (Some(expected), Some(provided)) => {
                bool::from(expected.as_bytes().ct_eq(provided.as_bytes()))
            }
            _ => false,
        };
        if !authorized {
            return Err(PreviewError::Unauthorized);
        }

        let slug = slug
            .map(|s| s.trim().trim_matches('/'))
            .filter(|s| !s.is_empty())
            .ok_or(PreviewError::MissingSlug)?;
        if slug
            .chars()
            .any(|c| c.is_control() || c.is_whitespace())
        {
            return Err(PreviewError::InvalidSlug(slug.to_string()));
        }
        let kind = match kind {
            None => ContentKind::Post,
            Some(raw) => {
                ContentKind::parse(raw).ok_or_else(|| PreviewError::UnknownKind(raw.to_string()))?
            }
        };
        Ok(kind.public_path(slug))
    }

    /// Where to send the browser after leaving preview mode.
    pub fn exit_redirect(&self, redirect: Option<&str>) -> String {
        match redirect {
            Some(target) if is_local_redirect(target) => target.to_string(),
            _ => "/".to_string(),
        }
    }
}
