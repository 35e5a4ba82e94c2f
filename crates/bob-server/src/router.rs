use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{api, handler, serve};

/// Room for multipart framing and the `hash` field on top of the bundle.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the axum router with all Bob endpoints.
///
/// API and static-asset routes are matched first; every other path goes
/// to the site router, which treats its first segment as an alias.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config().max_bundle_size.saturating_add(MULTIPART_OVERHEAD);

    let api = Router::new()
        .route("/api/health", get(handler::health_handler))
        .route("/api/info", get(handler::info_handler))
        .route("/api/artifacts", post(api::upload_artifact))
        .route("/api/artifacts/:id", get(api::get_artifact))
        .route("/api/deploy", post(api::deploy))
        .route("/api/deployments", get(api::list_deployments))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let sites = Router::new()
        .route("/", get(serve::site_root))
        .route("/*path", get(serve::serve_site))
        .with_state(state.clone());

    let static_route = format!("{}/*path", state.config().static_prefix);

    Router::new()
        .merge(api)
        .route(&static_route, get(serve::serve_static))
        .fallback_service(sites)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
