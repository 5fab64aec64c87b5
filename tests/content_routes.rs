mod support;

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use hollow::domain::content::{ContentKind, Revalidate};
use serde_json::json;

use support::{FakeCms, PREVIEW_SECRET, get, harness, post_json, record, send};

fn site() -> std::sync::Arc<FakeCms> {
    FakeCms::with(vec![
        record(ContentKind::Page, "home", Revalidate::After(600)),
        record(ContentKind::Page, "about", Revalidate::Never),
        record(ContentKind::Page, "company/team", Revalidate::After(120)),
        record(ContentKind::Post, "alpha", Revalidate::After(3600)),
        record(ContentKind::Post, "beta", Revalidate::After(3600)),
        record(ContentKind::Post, "gamma", Revalidate::After(3600)),
        record(ContentKind::Category, "news", Revalidate::After(300)),
        record(ContentKind::Author, "ada", Revalidate::After(300)),
    ])
}

#[tokio::test]
async fn health_reports_service_and_version() {
    let h = harness(site());
    let res = get(&h.router, "/health").await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "hollow");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["timestamp"].is_string());
    assert!(res.header("x-request-id").is_some());

    let head = send(
        &h.router,
        Request::head("/health").body(Body::empty()).expect("request"),
    )
    .await;
    assert_eq!(head.status, StatusCode::OK);
}

#[tokio::test]
async fn request_id_is_echoed() {
    let h = harness(site());
    let res = send(
        &h.router,
        Request::get("/health")
            .header("x-request-id", "trace-123")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(res.header("x-request-id"), Some("trace-123"));
}

#[tokio::test]
async fn landing_serves_the_configured_page() {
    let h = harness(site());
    let res = get(&h.router, "/").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["slug"], "home");
    assert_eq!(
        res.header("cache-control"),
        Some("public, s-maxage=600, stale-while-revalidate")
    );
}

#[tokio::test]
async fn posts_are_cached_after_first_fetch() {
    let h = harness(site());

    let first = get(&h.router, "/blog/alpha").await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.header("x-cache"), Some("MISS"));
    assert_eq!(first.json()["kind"], "post");

    let second = get(&h.router, "/blog/alpha").await;
    assert_eq!(second.header("x-cache"), Some("HIT"));
    assert_eq!(first.body, second.body);
    assert_eq!(h.cms.fetches(), 1);
}

#[tokio::test]
async fn matching_etag_returns_not_modified() {
    let h = harness(site());
    let first = get(&h.router, "/blog/alpha").await;
    let etag = first.header("etag").expect("etag").to_string();

    let res = send(
        &h.router,
        Request::get("/blog/alpha")
            .header("if-none-match", etag.as_str())
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(res.status, StatusCode::NOT_MODIFIED);
    assert!(res.body.is_empty());
    assert_eq!(res.header("etag"), Some(etag.as_str()));

    let res = send(
        &h.router,
        Request::get("/blog/alpha")
            .header("if-none-match", "\"stale\"")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn never_revalidated_records_get_a_year_long_header() {
    let h = harness(site());
    let res = get(&h.router, "/about").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.header("cache-control"),
        Some("public, s-maxage=31536000, stale-while-revalidate")
    );
}

#[tokio::test]
async fn nested_pages_resolve_by_uri() {
    let h = harness(site());
    let res = get(&h.router, "/company/team").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["slug"], "company/team");
}

#[tokio::test]
async fn archives_resolve_by_kind() {
    let h = harness(site());
    assert_eq!(get(&h.router, "/category/news").await.json()["kind"], "category");
    assert_eq!(get(&h.router, "/author/ada").await.json()["kind"], "author");
}

#[tokio::test]
async fn unknown_content_is_not_found_and_not_cached() {
    let h = harness(site());
    for _ in 0..2 {
        let res = get(&h.router, "/blog/missing").await;
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(res.json(), json!({"error": "Not found"}));
    }
    assert_eq!(h.cms.fetches(), 2);
}

#[tokio::test]
async fn upstream_failure_is_a_bad_gateway() {
    let h = harness(site());
    h.cms.fail(true);

    let res = get(&h.router, "/blog/alpha").await;
    assert_eq!(res.status, StatusCode::BAD_GATEWAY);
    let body = res.json();
    assert_eq!(body["error"], "Upstream content unavailable");
    assert!(body["details"].as_str().is_some_and(|d| d.contains("timed out")));

    h.cms.fail(false);
    let res = get(&h.router, "/blog/alpha").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.header("x-cache"), Some("MISS"));
}

#[tokio::test]
async fn blog_index_pages() {
    let h = harness(site());

    let res = get(&h.router, "/blog").await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["page"], 1);
    assert_eq!(body["total"], 3);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["posts"].as_array().map(Vec::len), Some(2));

    let res = get(&h.router, "/blog/page/2").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["posts"].as_array().map(Vec::len), Some(1));

    assert_eq!(get(&h.router, "/blog/page/3").await.status, StatusCode::NOT_FOUND);
    assert_eq!(get(&h.router, "/blog/page/zero").await.status, StatusCode::NOT_FOUND);

    let res = get(&h.router, "/blog/page/1").await;
    assert_eq!(res.status, StatusCode::PERMANENT_REDIRECT);
    assert_eq!(res.header("location"), Some("/blog"));
}

#[tokio::test]
async fn concurrent_misses_share_one_fetch() {
    let h = harness(site());
    h.cms.slow(Duration::from_millis(50));

    let requests = (0..8).map(|_| get(&h.router, "/blog/beta"));
    let responses = futures::future::join_all(requests).await;

    assert!(responses.iter().all(|res| res.status == StatusCode::OK));
    let first = &responses[0].body;
    assert!(responses.iter().all(|res| &res.body == first));
    assert_eq!(h.cms.fetches(), 1);
}

#[tokio::test]
async fn preview_flow_sets_cookie_and_bypasses_cache() {
    let h = harness(site());
    let mut draft = record(ContentKind::Post, "alpha", Revalidate::After(3600));
    draft.title = "Draft title".to_string();
    h.cms.put_draft(draft);

    get(&h.router, "/blog/alpha").await;

    let res = get(
        &h.router,
        &format!("/preview?secret={PREVIEW_SECRET}&slug=alpha&kind=post"),
    )
    .await;
    assert_eq!(res.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.header("location"), Some("/blog/alpha"));
    let cookie = res.header("set-cookie").expect("preview cookie").to_string();
    assert!(cookie.starts_with("hollow_preview=1"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));

    let res = send(
        &h.router,
        Request::get("/blog/alpha")
            .header("cookie", "hollow_preview=1")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.header("x-cache"), Some("BYPASS"));
    assert_eq!(res.header("cache-control"), Some("private, no-store"));
    assert_eq!(res.json()["title"], "Draft title");

    let res = get(&h.router, "/blog/alpha").await;
    assert_eq!(res.header("x-cache"), Some("HIT"));
    assert_eq!(res.json()["title"], "Title of alpha");
}

#[tokio::test]
async fn preview_entry_is_guarded() {
    let h = harness(site());

    let res = get(&h.router, "/preview?secret=wrong&slug=alpha").await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(res.header("set-cookie").is_none());

    let res = get(&h.router, &format!("/preview?secret={PREVIEW_SECRET}")).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = get(
        &h.router,
        &format!("/preview?secret={PREVIEW_SECRET}&slug=alpha&kind=widget"),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = get(
        &h.router,
        &format!("/preview?secret={PREVIEW_SECRET}&slug=a%0Ab"),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "Invalid slug");
    assert!(res.header("set-cookie").is_none());
}

#[tokio::test]
async fn exit_preview_clears_cookie_and_redirects_locally() {
    let h = harness(site());

    let res = get(&h.router, "/exit-preview?redirect=/blog/alpha").await;
    assert_eq!(res.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.header("location"), Some("/blog/alpha"));
    let cookie = res.header("set-cookie").expect("removal cookie");
    assert!(cookie.starts_with("hollow_preview="));

    let res = get(&h.router, "/exit-preview?redirect=//evil.example").await;
    assert_eq!(res.header("location"), Some("/"));

    let res = get(&h.router, "/exit-preview").await;
    assert_eq!(res.header("location"), Some("/"));
}

#[tokio::test]
async fn newsletter_validates_and_sends() {
    let h = harness(site());

    let res = post_json(&h.router, "/newsletter", json!({"email": "nope"}).to_string()).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "Invalid email address");

    let res = post_json(&h.router, "/newsletter", "{}").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = post_json(
        &h.router,
        "/newsletter",
        json!({"email": "  reader@example.com "}).to_string(),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({"success": true}));

    let sent = h.mailer.sent.lock().expect("sent lock");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["reader@example.com".to_string()]);
}

#[tokio::test]
async fn newsletter_without_sender_is_a_server_error() {
    let h = support::harness_with(
        site(),
        support::HarnessOptions {
            newsletter_from: None,
            ..support::HarnessOptions::default()
        },
    );

    let res = post_json(
        &h.router,
        "/newsletter",
        json!({"email": "reader@example.com"}).to_string(),
    )
    .await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json()["error"], "Newsletter service not configured");
}
