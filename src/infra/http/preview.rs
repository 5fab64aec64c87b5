use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::info;

use crate::application::{error::HttpError, preview::PREVIEW_COOKIE};

use super::HttpState;

#[derive(Debug, Default, Deserialize)]
pub(super) struct EnterQuery {
    secret: Option<String>,
    slug: Option<String>,
    kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ExitQuery {
    redirect: Option<String>,
}

/// `GET /preview?secret=..&slug=..&kind=..` sets the preview cookie and
/// redirects to the draft.
pub(super) async fn enter(
    State(state): State<HttpState>,
    jar: CookieJar,
    Query(query): Query<EnterQuery>,
) -> Response {
    let path = match state.preview.enter(
        query.secret.as_deref(),
        query.slug.as_deref(),
        query.kind.as_deref(),
    ) {
        Ok(path) => path,
        Err(err) => return HttpError::from(err).into_response(),
    };

    info!(target = "hollow::http::preview", path = %path, "preview mode enabled");
    let cookie = Cookie::build((PREVIEW_COOKIE, "1"))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/");
    (jar.add(cookie), Redirect::temporary(&path)).into_response()
}

pub(super) async fn exit(
    State(state): State<HttpState>,
    jar: CookieJar,
    Query(query): Query<ExitQuery>,
) -> Response {
    let target = state.preview.exit_redirect(query.redirect.as_deref());
    let jar = jar.remove(Cookie::build(PREVIEW_COOKIE).path("/"));
    (jar, Redirect::temporary(&target)).into_response()
}
