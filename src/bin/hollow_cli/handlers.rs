#![deny(clippy::all, clippy::pedantic)]

use hollow_api_types::{
    HealthResponse, PathsRevalidatedResponse, RebuildResponse, RevalidateRequest,
    SearchIndexPayload,
};
use serde::Serialize;

use crate::client::{CliError, Ctx};

pub async fn rebuild(ctx: &Ctx) -> Result<RebuildResponse, CliError> {
    let body = RevalidateRequest::rebuild(ctx.secret()?);
    ctx.post("revalidate", &body).await
}

/// Partial failures are reported as an error after the server answered.
pub async fn revalidate(ctx: &Ctx, paths: Vec<String>) -> Result<PathsRevalidatedResponse, CliError> {
    let body = RevalidateRequest::paths(ctx.secret()?, paths);
    let res: PathsRevalidatedResponse = ctx.post("revalidate", &body).await?;
    if !res.failed.is_empty() {
        let failed = res
            .failed
            .iter()
            .map(|f| format!("{} ({})", f.path, f.error))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(CliError::Server(format!("some paths failed: {failed}")));
    }
    Ok(res)
}

pub async fn health(ctx: &Ctx) -> Result<HealthResponse, CliError> {
    ctx.get("health").await
}

#[derive(Debug, Serialize)]
pub struct SearchIndexSummary {
    pub total: u64,
    pub version: String,
    pub generated: String,
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&SearchIndexPayload> for SearchIndexSummary {
    fn from(payload: &SearchIndexPayload) -> Self {
        Self {
            total: payload.total,
            version: payload.version.clone(),
            generated: payload.generated.clone(),
            degraded: payload.is_degraded(),
            error: payload.error.clone(),
        }
    }
}

pub async fn search_index(ctx: &Ctx) -> Result<SearchIndexPayload, CliError> {
    ctx.get("search-index").await
}
