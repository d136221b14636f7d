//! JWT authentication extractor.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use openerr_core::error::CoreError;
use openerr_core::types::DbId;

use crate::auth::cookie::{read_cookie, AUTH_COOKIE};
use crate::auth::jwt::{validate_token, SignInMethod};
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated dashboard user.
///
/// The token is taken from `Authorization: Bearer <jwt>` when that header is
/// present, otherwise from the `auth_token` cookie.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    pub email: String,
    pub method: SignInMethod,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = match parts.headers.get(AUTHORIZATION) {
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|v| v.strip_prefix("Bearer "))
                .ok_or_else(|| {
                    AppError::Core(CoreError::Unauthorized(
                        "Invalid Authorization format. Expected: Bearer <token>".into(),
                    ))
                })?,
            None => read_cookie(&parts.headers, AUTH_COOKIE).ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Not authenticated".into()))
            })?,
        };

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            email: claims.email,
            method: claims.method,
        })
    }
}
