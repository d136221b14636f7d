//! Project API key extractor for the ingest endpoint.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use openerr_core::api_keys::{hash_api_key, looks_like_api_key};
use openerr_core::error::CoreError;
use openerr_db::models::project::Project;
use openerr_db::repositories::ProjectRepo;

use crate::error::AppError;
use crate::state::AppState;

pub const MSG_NO_API_KEY: &str = "Unauthorized: No API key provided";
pub const MSG_INVALID_API_KEY: &str = "Unauthorized: Invalid API key";

/// The live project owning the `Authorization: Bearer <api key>` presented.
#[derive(Debug, Clone)]
pub struct ProjectKey {
    pub project: Project,
}

impl FromRequestParts<AppState> for ProjectKey {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::Core(CoreError::Unauthorized(MSG_NO_API_KEY.into())))?;

        let invalid = || AppError::Core(CoreError::Unauthorized(MSG_INVALID_API_KEY.into()));

        if !looks_like_api_key(key) {
            return Err(invalid());
        }

        let project = ProjectRepo::find_by_key_hash(&state.pool, &hash_api_key(key))
            .await?
            .ok_or_else(invalid)?;

        Ok(ProjectKey { project })
    }
}
