//! Operational endpoints: revalidation webhook, search index, newsletter.

use std::{any::Any, panic::AssertUnwindSafe};

use axum::{
    Json,
    extract::State,
    http::{HeaderValue, StatusCode, header::CACHE_CONTROL},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::FutureExt;
use hollow_api_types::{NewsletterRequest, NewsletterResponse};
use tracing::error;

use crate::application::{error::HttpError, revalidate::RevalidateOutcome};

use super::HttpState;

const SOURCE: &str = "infra::http::webhooks";

/// `POST /revalidate`. The body is read raw; the revalidator decides what a
/// malformed payload means.
pub(super) async fn revalidate(State(state): State<HttpState>, body: Bytes) -> Response {
    let revalidator = state.revalidator.clone();
    let outcome = AssertUnwindSafe(async move { revalidator.handle(&body).await })
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(RevalidateOutcome::Rebuilt(response))) => Json(response).into_response(),
        Ok(Ok(RevalidateOutcome::Paths(response))) => Json(response).into_response(),
        Ok(Err(err)) => HttpError::from(err).into_response(),
        Err(panic) => {
            let detail = panic_message(panic.as_ref());
            error!(target = SOURCE, detail = %detail, "revalidation panicked");
            HttpError::new(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                detail,
            )
            .with_details()
            .into_response()
        }
    }
}

pub(super) async fn search_index(State(state): State<HttpState>) -> Response {
    let response = state.search_index.index().await;
    let cache_control = response.cache_control();

    let mut http = Json(response.payload).into_response();
    let headers = http.headers_mut();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(cache_control));
    headers.insert("x-cache", HeaderValue::from_static(response.status.as_str()));
    http
}

pub(super) async fn newsletter(State(state): State<HttpState>, body: Bytes) -> Response {
    let request = match serde_json::from_slice::<NewsletterRequest>(&body) {
        Ok(request) => request,
        Err(err) => {
            return HttpError::from_error(
                SOURCE,
                StatusCode::BAD_REQUEST,
                "Email is required",
                &err,
            )
            .into_response();
        }
    };

    match state.newsletter.subscribe(&request.email).await {
        Ok(()) => Json(NewsletterResponse { success: true }).into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "request handler panicked".to_string()
    }
}
