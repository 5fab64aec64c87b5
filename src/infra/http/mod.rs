mod middleware;
mod preview;
mod public;
mod webhooks;

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::application::{
    newsletter::NewsletterService, preview::PreviewService, revalidate::Revalidator,
    search_index::SearchIndexService, site::SiteService,
};

pub use middleware::{REQUEST_ID_HEADER, RequestContext};

/// Services shared by every handler.
#[derive(Clone)]
pub struct HttpState {
    pub site: Arc<SiteService>,
    pub revalidator: Arc<Revalidator>,
    pub search_index: Arc<SearchIndexService>,
    pub preview: Arc<PreviewService>,
    pub newsletter: Arc<NewsletterService>,
}

pub fn build_router(state: HttpState) -> Router {
    let operational = Router::new()
        .route("/revalidate", post(webhooks::revalidate))
        .route("/search-index", get(webhooks::search_index))
        .route("/newsletter", post(webhooks::newsletter))
        .route("/health", get(public::health))
        .route("/preview", get(preview::enter))
        .route("/exit-preview", get(preview::exit));

    let content = Router::new()
        .route("/", get(public::landing))
        .route("/blog", get(public::blog_index))
        .route("/blog/page/{page}", get(public::blog_page))
        .route("/blog/{slug}", get(public::post))
        .route("/category/{slug}", get(public::category))
        .route("/author/{slug}", get(public::author))
        .route("/{*path}", get(public::page));

    operational
        .merge(content)
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}
