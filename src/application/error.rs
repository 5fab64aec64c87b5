use std::error::Error as StdError;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hollow_api_types::ErrorBody;
use thiserror::Error;

use crate::infra::error::InfraError;

/// Diagnostic detail attached to error responses and picked up by the
/// response logger. Never serialized to clients.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// An error response with a JSON `{error, details?}` body.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    body: ErrorBody,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status,
            body: ErrorBody::new(public_message),
            report: ErrorReport::from_message(source, status, detail),
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        Self {
            status,
            body: ErrorBody::new(public_message),
            report: ErrorReport::from_error(source, status, error),
        }
    }

    /// Expose the first diagnostic message as the body's `details` field.
    pub fn with_details(mut self) -> Self {
        if let Some(detail) = self.report.messages.first() {
            self.body = ErrorBody::with_details(self.body.error.clone(), detail.clone());
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &ErrorBody {
        &self.body
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();
        self.report.attach(&mut response);
        response
    }
}

/// Process-level failures surfaced from `main`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn report_collects_source_chain() {
        let inner = io::Error::other("socket closed");
        let outer = InfraError::from(inner);
        let report = ErrorReport::from_error("test", StatusCode::BAD_GATEWAY, &outer);

        assert_eq!(report.messages.len(), 2);
        assert!(report.messages[0].contains("socket closed"));
    }

    #[test]
    fn details_are_opt_in() {
        let plain = HttpError::new(
            "test",
            StatusCode::BAD_GATEWAY,
            "Upstream content unavailable",
            "status 503",
        );
        assert_eq!(plain.body().details, None);

        let detailed = plain.with_details();
        assert_eq!(detailed.body().error, "Upstream content unavailable");
        assert_eq!(detailed.body().details.as_deref(), Some("status 503"));
    }

    #[test]
    fn response_carries_report_extension() {
        let response = HttpError::new("test", StatusCode::NOT_FOUND, "Not found", "missing")
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.source, "test");
    }
}
