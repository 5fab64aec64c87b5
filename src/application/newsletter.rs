//! Newsletter subscription relayed to the mail provider.

use std::sync::Arc;

use axum::http::StatusCode;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::info;

use crate::application::error::HttpError;
use crate::application::sources::{MailError, Mailer, OutboundEmail};

const SOURCE: &str = "application::newsletter::NewsletterService";

static EMAIL_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

#[derive(Debug, Error)]
pub enum NewsletterError {
    #[error("`{0}` is not a valid email address")]
    InvalidEmail(String),
    #[error(transparent)]
    Mail(#[from] MailError),
}

impl From<NewsletterError> for HttpError {
    fn from(error: NewsletterError) -> Self {
        match &error {
            NewsletterError::InvalidEmail(_) => HttpError::from_error(
                SOURCE,
                StatusCode::BAD_REQUEST,
                "Invalid email address",
                &error,
            ),
            NewsletterError::Mail(MailError::NotConfigured) => HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Newsletter service not configured",
                &error,
            ),
            NewsletterError::Mail(_) => HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to subscribe",
                &error,
            ),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewsletterConfig {
    pub from: Option<String>,
    /// Address notified of every new subscriber.
    pub audience: Option<String>,
}

#[derive(Clone)]
pub struct NewsletterService {
    mailer: Arc<dyn Mailer>,
    config: NewsletterConfig,
}

impl NewsletterService {
    pub fn new(mailer: Arc<dyn Mailer>, config: NewsletterConfig) -> Self {
        Self { mailer, config }
    }

    pub async fn subscribe(&self, email: &str) -> Result<(), NewsletterError> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(NewsletterError::InvalidEmail(email.to_string()));
        }
        let from = self
            .config
            .from
            .clone()
            .ok_or(NewsletterError::Mail(MailError::NotConfigured))?;

        let escaped = escape_html(email);
        self.mailer
            .send(OutboundEmail {
                from: from.clone(),
                to: vec![email.to_string()],
                subject: "Thanks for subscribing".to_string(),
                html: format!(
                    "<p>You are subscribed with <strong>{escaped}</strong>. \
                     We will let you know when something new is published.</p>"
                ),
            })
            .await?;

        if let Some(audience) = &self.config.audience {
            self.mailer
                .send(OutboundEmail {
                    from,
                    to: vec![audience.clone()],
                    subject: "New newsletter subscriber".to_string(),
                    html: format!("<p>New subscriber: {escaped}</p>"),
                })
                .await?;
        }

        info!(target = SOURCE, "newsletter subscription accepted");
        Ok(())
    }
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254
        && EMAIL_PATTERN
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(email))
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
