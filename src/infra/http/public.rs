use std::time::Duration;

use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_TYPE, ETAG, IF_NONE_MATCH},
    },
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use hollow_api_types::HealthResponse;
use serde::Serialize;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use crate::{
    application::{error::HttpError, preview::PREVIEW_COOKIE},
    cache::Cached,
    domain::content::{ContentKind, ContentRecord},
};

use super::HttpState;

const SOURCE: &str = "infra::http::public";

/// `s-maxage` used for records that only the webhook refreshes.
const NEVER_EXPIRES_SECS: u64 = 31_536_000;
const X_CACHE: &str = "x-cache";

pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "hollow".to_string(),
        timestamp: OffsetDateTime::now_utc(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub(super) async fn landing(
    State(state): State<HttpState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Response {
    let preview = in_preview(&jar);
    record_response(state.site.landing(preview).await, preview, &headers)
}

pub(super) async fn post(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Response {
    by_slug(&state, ContentKind::Post, &slug, &jar, &headers).await
}

pub(super) async fn category(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Response {
    by_slug(&state, ContentKind::Category, &slug, &jar, &headers).await
}

pub(super) async fn author(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Response {
    by_slug(&state, ContentKind::Author, &slug, &jar, &headers).await
}

/// Any other path is a CMS page addressed by its URI.
pub(super) async fn page(
    State(state): State<HttpState>,
    Path(path): Path<String>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Response {
    let slug = path.trim_matches('/');
    if slug.is_empty() {
        return not_found(&path);
    }
    by_slug(&state, ContentKind::Page, slug, &jar, &headers).await
}

pub(super) async fn blog_index(
    State(state): State<HttpState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Response {
    blog_response(&state, 1, &jar, &headers).await
}

pub(super) async fn blog_page(
    State(state): State<HttpState>,
    Path(page): Path<String>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Response {
    match page.parse::<u32>() {
        Ok(1) => Redirect::permanent("/blog").into_response(),
        Ok(page) => blog_response(&state, page, &jar, &headers).await,
        Err(_) => not_found(&format!("/blog/page/{page}")),
    }
}

async fn by_slug(
    state: &HttpState,
    kind: ContentKind,
    slug: &str,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Response {
    let preview = in_preview(jar);
    record_response(
        state.site.content(kind, slug, preview).await,
        preview,
        headers,
    )
}

async fn blog_response(
    state: &HttpState,
    page: u32,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Response {
    let preview = in_preview(jar);
    let ttl = Some(Duration::from_secs(
        state.site.config().default_revalidate_secs,
    ));
    match state.site.blog_page(page, preview).await {
        Ok(Some(cached)) => json_response(cached, ttl, preview, headers),
        Ok(None) => not_found(&format!("/blog/page/{page}")),
        Err(err) => err.into_response(),
    }
}

fn record_response(
    result: Result<Option<Cached<ContentRecord>>, HttpError>,
    preview: bool,
    headers: &HeaderMap,
) -> Response {
    match result {
        Ok(Some(cached)) => {
            let ttl = cached.value.revalidate.ttl();
            json_response(cached, ttl, preview, headers)
        }
        Ok(None) => not_found("content"),
        Err(err) => err.into_response(),
    }
}

fn in_preview(jar: &CookieJar) -> bool {
    jar.get(PREVIEW_COOKIE).is_some()
}

fn not_found(what: &str) -> Response {
    HttpError::new(
        SOURCE,
        StatusCode::NOT_FOUND,
        "Not found",
        format!("no content for `{what}`"),
    )
    .into_response()
}

pub(super) fn cache_control(ttl: Option<Duration>, preview: bool) -> String {
    if preview {
        return "private, no-store".to_string();
    }
    let max_age = ttl.map_or(NEVER_EXPIRES_SECS, |ttl| ttl.as_secs());
    format!("public, s-maxage={max_age}, stale-while-revalidate")
}

fn json_response<T: Serialize>(
    cached: Cached<T>,
    ttl: Option<Duration>,
    preview: bool,
    request_headers: &HeaderMap,
) -> Response {
    let body = match serde_json::to_vec(&cached.value) {
        Ok(body) => body,
        Err(err) => {
            return HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &err,
            )
            .into_response();
        }
    };

    let etag = format!("\"{}\"", &hex::encode(Sha256::digest(&body))[..32]);
    let not_modified = request_headers
        .get(IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|candidates| {
            candidates
                .split(',')
                .any(|candidate| candidate.trim().trim_start_matches("W/") == etag)
        });

    let mut response = if not_modified {
        StatusCode::NOT_MODIFIED.into_response()
    } else {
        let mut response = Response::new(Body::from(body));
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    };

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&cache_control(ttl, preview)) {
        headers.insert(CACHE_CONTROL, value);
    }
    if let Ok(value) = HeaderValue::from_str(&etag) {
        headers.insert(ETAG, value);
    }
    headers.insert(X_CACHE, HeaderValue::from_static(cached.status.as_str()));
    response
}
