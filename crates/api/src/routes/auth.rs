//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /register            -> register
/// POST /login               -> login
/// POST /verify-credentials  -> verify_credentials
/// POST /otp/send            -> send_otp
/// POST /otp/verify          -> verify_otp
/// POST /logout              -> logout (requires auth)
/// GET  /me                  -> me (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/verify-credentials", post(auth::verify_credentials))
        .route("/otp/send", post(auth::send_otp))
        .route("/otp/verify", post(auth::verify_otp))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}
