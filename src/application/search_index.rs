//! Cached proxy for the search document index.
//!
//! The index is a non-critical feature: every failure degrades to an empty but
//! well-formed payload served with 200 and a short cache lifetime.

use std::sync::Arc;
use std::time::Duration;

use hollow_api_types::SearchIndexPayload;
use metrics::counter;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::warn;

use crate::application::sources::{SearchIndexError, SearchIndexSource};
use crate::cache::{CacheKey, CacheStatus, CacheTag, ContentCache};

const SOURCE: &str = "application::search_index::SearchIndexService";

pub const HEALTHY_CACHE_CONTROL: &str = "public, s-maxage=300, stale-while-revalidate=600";
pub const DEGRADED_CACHE_CONTROL: &str = "public, s-maxage=60, stale-while-revalidate=120";

pub const NOT_AVAILABLE: &str = "Search index not available";
pub const FETCH_FAILED: &str = "Failed to fetch search index";

#[derive(Debug, Clone)]
pub struct SearchIndexResponse {
    pub payload: SearchIndexPayload,
    pub status: CacheStatus,
}

impl SearchIndexResponse {
    pub fn cache_control(&self) -> &'static str {
        if self.payload.is_degraded() {
            DEGRADED_CACHE_CONTROL
        } else {
            HEALTHY_CACHE_CONTROL
        }
    }
}

#[derive(Clone)]
pub struct SearchIndexService {
    source: Arc<dyn SearchIndexSource>,
    cache: Arc<ContentCache>,
    ttl: Duration,
    fallback_ttl: Duration,
}

impl SearchIndexService {
    pub fn new(
        source: Arc<dyn SearchIndexSource>,
        cache: Arc<ContentCache>,
        ttl: Duration,
        fallback_ttl: Duration,
    ) -> Self {
        Self {
            source,
            cache,
            ttl,
            fallback_ttl,
        }
    }

    pub async fn index(&self) -> SearchIndexResponse {
        let source = Arc::clone(&self.source);
        let (ttl, fallback_ttl) = (self.ttl, self.fallback_ttl);

        let cached = self
            .cache
            .get_or_fetch(
                CacheKey::search_index(),
                vec![CacheTag::search_index(), CacheTag::root()],
                move |payload: &SearchIndexPayload| {
                    Some(if payload.is_degraded() { fallback_ttl } else { ttl })
                },
                move || async move { Ok(Some(fetch_or_degrade(source.as_ref()).await)) },
            )
            .await;

        match cached {
            Ok(Some(cached)) => SearchIndexResponse {
                payload: cached.value,
                status: cached.status,
            },
            Ok(None) => degraded_response(FETCH_FAILED),
            Err(err) => {
                warn!(target = SOURCE, error = %err, "search index cache failed");
                degraded_response(FETCH_FAILED)
            }
        }
    }
}

async fn fetch_or_degrade(source: &dyn SearchIndexSource) -> SearchIndexPayload {
    match source.fetch_index().await {
        Ok(payload) => payload,
        Err(SearchIndexError::NotFound) => {
            counter!("hollow_search_index_degraded_total", "reason" => "not_found").increment(1);
            SearchIndexPayload::degraded(now_rfc3339(), NOT_AVAILABLE)
        }
        Err(SearchIndexError::Fetch(err)) => {
            counter!("hollow_search_index_degraded_total", "reason" => "fetch_failed").increment(1);
            warn!(target = SOURCE, error = %err, "search index fetch failed, serving empty index");
            SearchIndexPayload::degraded(now_rfc3339(), FETCH_FAILED)
        }
    }
}

fn degraded_response(error: &str) -> SearchIndexResponse {
    SearchIndexResponse {
        payload: SearchIndexPayload::degraded(now_rfc3339(), error),
        status: CacheStatus::Bypass,
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
