//! The public ingest endpoint.

use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::routing::post;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::ingest;
use crate::state::AppState;

/// Full path of the ingest endpoint.
pub const INGEST_PATH: &str = "/api/v1/errors";

/// `POST /api/v1/errors`, authenticated by project API key.
///
/// Reporting SDKs call this from any origin, so it carries a wildcard CORS
/// policy of its own instead of the dashboard's origin list. Credentials are
/// never accepted cross-origin here.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(INGEST_PATH, post(ingest::ingest_errors))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::POST, Method::OPTIONS])
                .allow_headers([CONTENT_TYPE, AUTHORIZATION])
                .max_age(Duration::from_secs(86400)),
        )
}
