//! Page templates resolved through the content cache.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::error::HttpError;
use crate::application::sources::{ContentSource, FetchError};
use crate::cache::{CacheKey, CacheStatus, CacheTag, Cached, ContentCache, content_tags};
use crate::domain::content::{ContentKind, ContentRecord, PostSummary};

const SOURCE: &str = "application::site::SiteService";

/// Template-level settings the site service needs.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub landing_slug: String,
    pub posts_per_page: u32,
    /// TTL for entries that are not a single CMS record (blog index pages).
    pub default_revalidate_secs: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            landing_slug: "home".to_string(),
            posts_per_page: 10,
            default_revalidate_secs: crate::domain::content::DEFAULT_REVALIDATE_SECS,
        }
    }
}

/// One page of the blog index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPage {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u32,
    pub posts: Vec<PostSummary>,
}

#[derive(Clone)]
pub struct SiteService {
    source: Arc<dyn ContentSource>,
    cache: Arc<ContentCache>,
    config: SiteConfig,
}

impl SiteService {
    pub fn new(source: Arc<dyn ContentSource>, cache: Arc<ContentCache>, config: SiteConfig) -> Self {
        Self {
            source,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// The landing page, served at `/`.
    pub async fn landing(&self, preview: bool) -> Result<Option<Cached<ContentRecord>>, HttpError> {
        let slug = self.config.landing_slug.clone();
        self.resolve(ContentKind::Page, &slug, "/", preview).await
    }

    /// A single record by kind and slug, tagged with its public path.
    pub async fn content(
        &self,
        kind: ContentKind,
        slug: &str,
        preview: bool,
    ) -> Result<Option<Cached<ContentRecord>>, HttpError> {
        let path = kind.public_path(slug);
        self.resolve(kind, slug, &path, preview).await
    }

    /// Blog index page `page` (1-based). `None` when the page is out of range.
    pub async fn blog_page(
        &self,
        page: u32,
        preview: bool,
    ) -> Result<Option<Cached<BlogPage>>, HttpError> {
        if page == 0 {
            return Ok(None);
        }
        let page_size = self.config.posts_per_page.max(1);

        if preview {
            let listed = load_blog_page(Arc::clone(&self.source), page, page_size)
                .await
                .map_err(|err| upstream_failure("blog_page", &err))?;
            return Ok(listed.map(|value| Cached {
                value,
                status: CacheStatus::Bypass,
            }));
        }

        let path = if page == 1 {
            "/blog".to_string()
        } else {
            format!("/blog/page/{page}")
        };
        let tags = vec![
            CacheTag::root(),
            CacheTag::kind(ContentKind::Post),
            CacheTag::path(&path),
        ];
        let ttl = Duration::from_secs(self.config.default_revalidate_secs);
        let source = Arc::clone(&self.source);

        self.cache
            .get_or_fetch(
                CacheKey::blog_page(page, page_size),
                tags,
                move |_: &BlogPage| Some(ttl),
                move || load_blog_page(source, page, page_size),
            )
            .await
            .map_err(|err| upstream_failure("blog_page", &err))
    }

    async fn resolve(
        &self,
        kind: ContentKind,
        slug: &str,
        path: &str,
        preview: bool,
    ) -> Result<Option<Cached<ContentRecord>>, HttpError> {
        if preview {
            debug!(target = SOURCE, %kind, slug, "bypassing cache for preview");
            let record = self
                .source
                .fetch_by_slug(kind, slug, true)
                .await
                .map_err(|err| upstream_failure("fetch_by_slug", &err))?;
            return Ok(record.map(|value| Cached {
                value,
                status: CacheStatus::Bypass,
            }));
        }

        let source = Arc::clone(&self.source);
        let owned_slug = slug.to_string();
        self.cache
            .get_or_fetch(
                CacheKey::content(kind, slug),
                self.tags_for(kind, slug, path),
                |record: &ContentRecord| record.revalidate.ttl(),
                move || async move { source.fetch_by_slug(kind, &owned_slug, false).await },
            )
            .await
            .map_err(|err| upstream_failure("fetch_by_slug", &err))
    }

    /// The landing page and `/{landing_slug}` share one entry, so it carries
    /// both path tags no matter which route filled it.
    fn tags_for(&self, kind: ContentKind, slug: &str, path: &str) -> Vec<CacheTag> {
        let mut tags = content_tags(kind, slug, path);
        if kind == ContentKind::Page
            && slug.trim_matches('/') == self.config.landing_slug.trim_matches('/')
        {
            for alias in [CacheTag::path("/"), CacheTag::path(&kind.public_path(slug))] {
                if !tags.contains(&alias) {
                    tags.push(alias);
                }
            }
        }
        tags
    }
}

async fn load_blog_page(
    source: Arc<dyn ContentSource>,
    page: u32,
    page_size: u32,
) -> Result<Option<BlogPage>, FetchError> {
    let total = source.count_all(ContentKind::Post).await?;
    let total_pages = total_pages(total, page_size);
    if page > total_pages {
        return Ok(None);
    }

    let records = source.fetch_page(page, page_size).await?;
    let posts = records
        .into_iter()
        .map(|record| PostSummary {
            slug: record.slug,
            title: record.title,
            excerpt: record.excerpt.unwrap_or_default(),
            published_at: record.published_at,
        })
        .collect();

    Ok(Some(BlogPage {
        page,
        page_size,
        total,
        total_pages,
        posts,
    }))
}

/// Number of index pages; an empty blog still has one (empty) page.
fn total_pages(total: u64, page_size: u32) -> u32 {
    let pages = total.div_ceil(u64::from(page_size.max(1)));
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

fn upstream_failure(operation: &'static str, err: &FetchError) -> HttpError {
    HttpError::new(
        SOURCE,
        StatusCode::BAD_GATEWAY,
        "Upstream content unavailable",
        format!("{operation} failed: {err}"),
    )
    .with_details()
}
