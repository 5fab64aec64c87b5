use async_trait::async_trait;
use hollow_api_types::{SearchDocument, SearchIndexPayload};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use url::Url;

use crate::application::sources::{FetchError, SearchIndexError, SearchIndexSource};

use super::map_reqwest_error;

/// Upstream index body. Only `posts` is required; the rest is filled in.
#[derive(Debug, Deserialize)]
struct RawIndex {
    #[serde(default)]
    posts: Vec<SearchDocument>,
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    generated: Option<String>,
    #[serde(default)]
    total: Option<u64>,
}

impl RawIndex {
    fn into_payload(self) -> SearchIndexPayload {
        let version = match self.version {
            Some(Value::String(v)) => v,
            Some(Value::Number(n)) => n.to_string(),
            _ => "1".to_string(),
        };
        let total = self.total.unwrap_or(self.posts.len() as u64);
        let generated = self.generated.unwrap_or_else(|| {
            OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default()
        });

        SearchIndexPayload {
            posts: self.posts,
            version,
            generated,
            total,
            error: None,
        }
    }
}

/// Fetches the search document index over plain HTTP.
///
/// With no endpoint configured the index reports itself as not found, which
/// callers treat the same as an upstream 404.
#[derive(Clone)]
pub struct HttpSearchIndexSource {
    http: Client,
    endpoint: Option<Url>,
}

impl HttpSearchIndexSource {
    pub fn new(http: Client, endpoint: Option<Url>) -> Self {
        Self { http, endpoint }
    }
}

#[async_trait]
impl SearchIndexSource for HttpSearchIndexSource {
    async fn fetch_index(&self) -> Result<SearchIndexPayload, SearchIndexError> {
        let Some(endpoint) = self.endpoint.clone() else {
            return Err(SearchIndexError::NotFound);
        };

        let response = self
            .http
            .get(endpoint)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        match response.status() {
            StatusCode::NOT_FOUND => return Err(SearchIndexError::NotFound),
            status if !status.is_success() => {
                return Err(FetchError::Status(status.as_u16()).into());
            }
            _ => {}
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let value: Value = serde_json::from_slice(&body).map_err(FetchError::decode)?;
        if !value.is_object() {
            return Err(FetchError::decode("search index body is not a JSON object").into());
        }
        let raw: RawIndex = serde_json::from_value(value).map_err(FetchError::decode)?;
        Ok(raw.into_payload())
    }
}
