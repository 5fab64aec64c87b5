//! WordPress adapters: GraphQL content source and the search index endpoint.

mod model;
mod queries;
mod search;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::application::sources::{ContentSource, FetchError};
use crate::domain::content::{ContentKind, ContentRecord};
use crate::infra::error::InfraError;

use model::{CountData, GraphqlResponse, NodeData, PageData};

pub use search::HttpSearchIndexSource;

const SOURCE: &str = "infra::wordpress";

/// Shared HTTP client for every upstream call, bounded by `timeout`.
pub fn http_client(timeout: Duration) -> Result<Client, InfraError> {
    Client::builder()
        .user_agent(concat!("hollow/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|err| InfraError::configuration(format!("failed to build http client: {err}")))
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_decode() {
        FetchError::decode(err)
    } else {
        FetchError::transport(err)
    }
}

/// [`ContentSource`] backed by a WPGraphQL endpoint.
#[derive(Clone)]
pub struct GraphqlContentSource {
    http: Client,
    endpoint: Url,
    auth_token: Option<String>,
    fallback_revalidate_secs: u64,
}

impl GraphqlContentSource {
    pub fn new(
        http: Client,
        endpoint: Url,
        auth_token: Option<String>,
        fallback_revalidate_secs: u64,
    ) -> Self {
        Self {
            http,
            endpoint,
            auth_token,
            fallback_revalidate_secs,
        }
    }

    async fn query<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        query: String,
        variables: Value,
        authenticated: bool,
    ) -> Result<T, FetchError> {
        let mut request = self
            .http
            .post(self.endpoint.clone())
            .json(&json!({ "query": query, "variables": variables }));
        if authenticated
            && let Some(token) = self.auth_token.as_deref()
        {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let envelope: GraphqlResponse<T> =
            serde_json::from_slice(&body).map_err(FetchError::decode)?;

        if !envelope.errors.is_empty() {
            let messages = envelope
                .errors
                .into_iter()
                .map(|err| err.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(FetchError::Upstream(messages));
        }

        debug!(target = SOURCE, operation, "graphql query succeeded");
        envelope
            .data
            .ok_or_else(|| FetchError::decode("response carried no data"))
    }
}

#[async_trait]
impl ContentSource for GraphqlContentSource {
    async fn fetch_by_slug(
        &self,
        kind: ContentKind,
        slug: &str,
        preview: bool,
    ) -> Result<Option<ContentRecord>, FetchError> {
        let id = match kind {
            ContentKind::Page => format!("/{}/", slug.trim_matches('/')),
            _ => slug.to_string(),
        };
        let data: NodeData = self
            .query(
                "fetch_by_slug",
                queries::by_slug(kind),
                json!({ "id": id, "asPreview": preview }),
                preview,
            )
            .await?;

        Ok(data.node.map(|node| {
            let mut record = node.into_record(kind, self.fallback_revalidate_secs);
            if kind == ContentKind::Page {
                slug.trim_matches('/').clone_into(&mut record.slug);
            }
            record
        }))
    }

    async fn fetch_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<Vec<ContentRecord>, FetchError> {
        let offset = page_number.saturating_sub(1).saturating_mul(page_size);
        let data: PageData = self
            .query(
                "fetch_page",
                queries::post_page(),
                json!({ "offset": offset, "size": page_size }),
                false,
            )
            .await?;

        Ok(data
            .nodes
            .map(|connection| connection.nodes)
            .unwrap_or_default()
            .into_iter()
            .map(|node| node.into_record(ContentKind::Post, self.fallback_revalidate_secs))
            .collect())
    }

    async fn count_all(&self, kind: ContentKind) -> Result<u64, FetchError> {
        let data: CountData = self
            .query("count_all", queries::count(kind), json!({}), false)
            .await?;
        Ok(data.connection.map(|c| c.total()).unwrap_or(0))
    }
}
