//! Site serving.
//!
//! Every miss is a bare `404 Not found`; no redirects. `HEAD` is answered
//! by the `GET` routes with the body dropped.

use axum::extract::{Path, State};
use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE, REFERER};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bob_resolve::{Entry, Outcome, ServedFile};

use crate::state::AppState;

const X_DEPLOYMENT_URL: HeaderName = HeaderName::from_static("x-deployment-url");
const X_HTML_REWRITTEN: HeaderName = HeaderName::from_static("x-html-rewritten");

/// `GET /`: there is no site at the root.
pub async fn site_root() -> Response {
    not_found()
}

/// `GET /{alias}/{path…}`, and sub-resources recovered from the referrer.
pub async fn serve_site(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Response {
    serve(&state, Entry::Primary, &path, &headers).await
}

/// `GET {static_prefix}/{path…}`: alias from the referrer only.
pub async fn serve_static(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Response {
    serve(&state, Entry::ReferrerOnly, &path, &headers).await
}

async fn serve(state: &AppState, entry: Entry, path: &str, headers: &HeaderMap) -> Response {
    let referer = headers.get(REFERER).and_then(|v| v.to_str().ok());
    match state.resolver().resolve(entry, path, referer).await {
        Ok(Outcome::Found(file)) => file_response(file),
        Ok(Outcome::NotFound(miss)) => {
            tracing::debug!(path, ?entry, reason = miss.reason(), "not found");
            not_found()
        }
        Err(e) => {
            tracing::error!(path, ?entry, error = %e, "serving failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

fn file_response(file: ServedFile) -> Response {
    let mut response = (StatusCode::OK, file.body).into_response();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(file.content_type));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(bob_resolve::CACHE_CONTROL));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    if let Ok(alias) = HeaderValue::from_str(&file.alias) {
        headers.insert(X_DEPLOYMENT_URL, alias);
    }
    if file.html_rewritten {
        headers.insert(X_HTML_REWRITTEN, HeaderValue::from_static("true"));
    }
    response
}
