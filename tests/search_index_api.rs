mod support;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use hollow::infra::wordpress::{HttpSearchIndexSource, http_client};
use httpmock::MockServer;
use serde_json::json;
use url::Url;

use support::{FakeCms, HarnessOptions, SECRET, get, harness_with, post_json};

const HEALTHY: &str = "public, s-maxage=300, stale-while-revalidate=600";
const DEGRADED: &str = "public, s-maxage=60, stale-while-revalidate=120";

fn harness_for(endpoint: Option<Url>) -> support::Harness {
    let http = http_client(Duration::from_secs(5)).expect("http client");
    harness_with(
        FakeCms::with(Vec::new()),
        HarnessOptions {
            search: Arc::new(HttpSearchIndexSource::new(http, endpoint)),
            ..HarnessOptions::default()
        },
    )
}

fn endpoint(server: &MockServer) -> Option<Url> {
    Some(Url::parse(&server.url("/wp-json/hollow/v1/search-index")).expect("url"))
}

fn assert_degraded(body: &serde_json::Value, error: &str) {
    assert_eq!(body["posts"], json!([]));
    assert_eq!(body["version"], "0");
    assert_eq!(body["total"], 0);
    assert_eq!(body["error"], error);
    assert!(body["generated"].is_string());
}

#[tokio::test]
async fn healthy_index_is_served_and_cached() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET").path("/wp-json/hollow/v1/search-index");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "posts": [
                    {"id": 1, "slug": "hello", "title": "Hello", "categories": ["news"]},
                    {"id": 2, "slug": "world", "title": "World"}
                ],
                "version": "42",
                "generated": "2024-05-01T10:00:00Z",
                "total": 2
            }));
    });
    let h = harness_for(endpoint(&server));

    let first = get(&h.router, "/search-index").await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.header("cache-control"), Some(HEALTHY));
    assert_eq!(first.header("x-cache"), Some("MISS"));
    let body = first.json();
    assert_eq!(body["total"], 2);
    assert_eq!(body["version"], "42");
    assert_eq!(body["posts"][0]["slug"], "hello");
    assert!(body.get("error").is_none());

    let second = get(&h.router, "/search-index").await;
    assert_eq!(second.header("x-cache"), Some("HIT"));
    mock.assert_hits(1);
}

#[tokio::test]
async fn upstream_404_degrades_to_not_available() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/wp-json/hollow/v1/search-index");
        then.status(404);
    });
    let h = harness_for(endpoint(&server));

    let res = get(&h.router, "/search-index").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.header("cache-control"), Some(DEGRADED));
    assert_degraded(&res.json(), "Search index not available");
}

#[tokio::test]
async fn malformed_body_degrades_to_fetch_failed() {
    for body in ["[1, 2, 3]", "\"just a string\"", "<html>oops</html>"] {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("GET").path("/wp-json/hollow/v1/search-index");
            then.status(200)
                .header("content-type", "application/json")
                .body(body);
        });
        let h = harness_for(endpoint(&server));

        let res = get(&h.router, "/search-index").await;
        assert_eq!(res.status, StatusCode::OK, "body: {body}");
        assert_eq!(res.header("cache-control"), Some(DEGRADED));
        assert_degraded(&res.json(), "Failed to fetch search index");
    }
}

#[tokio::test]
async fn server_errors_degrade_to_fetch_failed() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/wp-json/hollow/v1/search-index");
        then.status(503);
    });
    let h = harness_for(endpoint(&server));

    let res = get(&h.router, "/search-index").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_degraded(&res.json(), "Failed to fetch search index");
}

#[tokio::test]
async fn unconfigured_endpoint_reports_not_available() {
    let h = harness_for(None);

    let res = get(&h.router, "/search-index").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.header("cache-control"), Some(DEGRADED));
    assert_degraded(&res.json(), "Search index not available");
}

#[tokio::test]
async fn rebuild_drops_the_cached_index() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET").path("/wp-json/hollow/v1/search-index");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"posts": [], "version": "1"}));
    });
    let h = harness_for(endpoint(&server));

    get(&h.router, "/search-index").await;
    let res = post_json(
        &h.router,
        "/revalidate",
        json!({"secret": SECRET, "action": "rebuild"}).to_string(),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = get(&h.router, "/search-index").await;
    assert_eq!(res.header("x-cache"), Some("MISS"));
    mock.assert_hits(2);
}
