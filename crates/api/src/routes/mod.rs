pub mod auth;
pub mod health;
pub mod ingest;
pub mod project;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree for the dashboard.
///
/// ```text
/// /auth/register                          register (public)
/// /auth/login                             login (public)
/// /auth/verify-credentials                password check, OTP step 1 (public)
/// /auth/otp/send                          password check + emailed code (public)
/// /auth/otp/verify                        sign in with a code (public)
/// /auth/logout                            logout (requires auth)
/// /auth/me                                current user + projects
///
/// /projects                               list, create
/// /projects/{id}                          get, update, delete
/// /projects/{id}/rotate-key               new API key (POST)
/// /projects/{id}/test-connection          ping the log database (POST)
/// /projects/{id}/errors                   recent records (?limit=)
/// /projects/{id}/insights                 aggregated insights
/// /projects/{id}/dashboard                insights + records
///
/// /severity/{error_type}                  badge for an error type
/// ```
///
/// The ingest endpoint (`POST /api/v1/errors`) has its own CORS policy and is
/// mounted separately, see [`ingest::router`].
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/projects", project::router())
        .route(
            "/severity/{error_type}",
            get(handlers::dashboard::get_severity),
        )
}
