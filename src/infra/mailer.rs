//! Resend-compatible HTTP mail provider.

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::application::sources::{MailError, Mailer, OutboundEmail};

const SOURCE: &str = "infra::mailer::HttpMailer";

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
}

#[derive(Clone)]
pub struct HttpMailer {
    http: Client,
    api_url: Url,
    api_key: Option<String>,
}

impl HttpMailer {
    pub fn new(http: Client, api_url: Url, api_key: Option<String>) -> Self {
        Self {
            http,
            api_url,
            api_key,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        let key = self.api_key.as_deref().ok_or(MailError::NotConfigured)?;

        let response = self
            .http
            .post(self.api_url.clone())
            .header(header::AUTHORIZATION, format!("Bearer {key}"))
            .json(&SendRequest {
                from: &email.from,
                to: &email.to,
                subject: &email.subject,
                html: &email.html,
            })
            .send()
            .await
            .map_err(|err| MailError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected(format!("status {status}: {body}")));
        }

        debug!(target = SOURCE, recipients = email.to.len(), "email accepted by provider");
        Ok(())
    }
}
