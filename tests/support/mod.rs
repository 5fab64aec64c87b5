//! In-memory upstreams and request helpers shared by the router tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode},
};
use hollow::application::{
    newsletter::{NewsletterConfig, NewsletterService},
    preview::PreviewService,
    revalidate::Revalidator,
    search_index::SearchIndexService,
    site::{SiteConfig, SiteService},
    sources::{
        ContentSource, FetchError, MailError, Mailer, OutboundEmail, SearchIndexError,
        SearchIndexSource,
    },
};
use hollow::cache::{CacheConfig, CacheStore, ContentCache, MemoryStore};
use hollow::domain::content::{ContentKind, ContentRecord, Revalidate};
use hollow::infra::http::{HttpState, build_router};
use hollow_api_types::SearchIndexPayload;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub const SECRET: &str = "hook-secret";
pub const PREVIEW_SECRET: &str = "preview-secret";

pub fn record(kind: ContentKind, slug: &str, revalidate: Revalidate) -> ContentRecord {
    ContentRecord {
        kind,
        slug: slug.to_string(),
        title: format!("Title of {slug}"),
        body_html: format!("<p>{slug}</p>"),
        excerpt: None,
        published_at: Some("2024-05-01T10:00:00".to_string()),
        author: None,
        featured_image: None,
        seo_title: None,
        seo_description: None,
        blocks: Vec::new(),
        posts: Vec::new(),
        revalidate,
    }
}

/// Content source backed by a map, counting every upstream call.
#[derive(Default)]
pub struct FakeCms {
    records: Mutex<HashMap<(ContentKind, String), ContentRecord>>,
    drafts: Mutex<HashMap<(ContentKind, String), ContentRecord>>,
    fetches: AtomicUsize,
    failing: Mutex<bool>,
    delay: Mutex<Option<Duration>>,
}

impl FakeCms {
    pub fn with(records: Vec<ContentRecord>) -> Arc<Self> {
        let cms = Self::default();
        for record in records {
            cms.put(record);
        }
        Arc::new(cms)
    }

    pub fn put(&self, record: ContentRecord) {
        self.records
            .lock()
            .expect("records lock")
            .insert((record.kind, record.slug.clone()), record);
    }

    pub fn put_draft(&self, record: ContentRecord) {
        self.drafts
            .lock()
            .expect("drafts lock")
            .insert((record.kind, record.slug.clone()), record);
    }

    pub fn fail(&self, failing: bool) {
        *self.failing.lock().expect("failing lock") = failing;
    }

    pub fn slow(&self, delay: Duration) {
        *self.delay.lock().expect("delay lock") = Some(delay);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    async fn upstream_call(&self) -> Result<(), FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().expect("delay lock");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.failing.lock().expect("failing lock") {
            return Err(FetchError::Timeout);
        }
        Ok(())
    }
}

#[async_trait]
impl ContentSource for FakeCms {
    async fn fetch_by_slug(
        &self,
        kind: ContentKind,
        slug: &str,
        preview: bool,
    ) -> Result<Option<ContentRecord>, FetchError> {
        self.upstream_call().await?;
        let key = (kind, slug.to_string());
        if preview
            && let Some(draft) = self.drafts.lock().expect("drafts lock").get(&key)
        {
            return Ok(Some(draft.clone()));
        }
        Ok(self.records.lock().expect("records lock").get(&key).cloned())
    }

    async fn fetch_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<Vec<ContentRecord>, FetchError> {
        self.upstream_call().await?;
        let mut posts: Vec<ContentRecord> = self
            .records
            .lock()
            .expect("records lock")
            .values()
            .filter(|record| record.kind == ContentKind::Post)
            .cloned()
            .collect();
        posts.sort_by(|a, b| a.slug.cmp(&b.slug));
        let skip = ((page_number - 1) * page_size) as usize;
        Ok(posts.into_iter().skip(skip).take(page_size as usize).collect())
    }

    async fn count_all(&self, kind: ContentKind) -> Result<u64, FetchError> {
        self.upstream_call().await?;
        Ok(self
            .records
            .lock()
            .expect("records lock")
            .values()
            .filter(|record| record.kind == kind)
            .count() as u64)
    }
}

/// Search index source that is never consulted by the content tests.
pub struct NoSearchIndex;

#[async_trait]
impl SearchIndexSource for NoSearchIndex {
    async fn fetch_index(&self) -> Result<SearchIndexPayload, SearchIndexError> {
        Err(SearchIndexError::NotFound)
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutboundEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        self.sent.lock().expect("sent lock").push(email);
        Ok(())
    }
}

pub struct Harness {
    pub router: Router,
    pub cms: Arc<FakeCms>,
    pub cache: Arc<ContentCache>,
    pub mailer: Arc<RecordingMailer>,
}

pub struct HarnessOptions {
    pub revalidate_secret: Option<String>,
    pub newsletter_from: Option<String>,
    pub search: Arc<dyn SearchIndexSource>,
    /// Store behind the content cache; a fresh `MemoryStore` when unset.
    pub store: Option<Arc<dyn CacheStore>>,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            revalidate_secret: Some(SECRET.to_string()),
            newsletter_from: Some("news@example.com".to_string()),
            search: Arc::new(NoSearchIndex),
            store: None,
        }
    }
}

pub fn harness(cms: Arc<FakeCms>) -> Harness {
    harness_with(cms, HarnessOptions::default())
}

pub fn harness_with(cms: Arc<FakeCms>, options: HarnessOptions) -> Harness {
    let cache_config = CacheConfig::default();
    let store: Arc<dyn CacheStore> = match options.store {
        Some(store) => store,
        None => Arc::new(MemoryStore::new(&cache_config)),
    };
    let cache = Arc::new(ContentCache::new(store));
    let mailer = Arc::new(RecordingMailer::default());

    let state = HttpState {
        site: Arc::new(SiteService::new(
            cms.clone(),
            cache.clone(),
            SiteConfig {
                posts_per_page: 2,
                ..SiteConfig::default()
            },
        )),
        revalidator: Arc::new(Revalidator::new(cache.clone(), options.revalidate_secret)),
        search_index: Arc::new(SearchIndexService::new(
            options.search,
            cache.clone(),
            cache_config.search_index_ttl(),
            cache_config.search_index_fallback_ttl(),
        )),
        preview: Arc::new(PreviewService::new(Some(PREVIEW_SECRET.to_string()))),
        newsletter: Arc::new(NewsletterService::new(
            mailer.clone(),
            NewsletterConfig {
                from: options.newsletter_from,
                audience: None,
            },
        )),
    };

    Harness {
        router: build_router(state),
        cms,
        cache,
        mailer,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("json body")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes()
        .to_vec();
    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn get(router: &Router, uri: &str) -> TestResponse {
    send(
        router,
        Request::get(uri).body(Body::empty()).expect("request"),
    )
    .await
}

pub async fn post_json(router: &Router, uri: &str, body: impl Into<Body>) -> TestResponse {
    send(
        router,
        Request::post(uri)
            .header("content-type", "application/json")
            .body(body.into())
            .expect("request"),
    )
    .await
}
