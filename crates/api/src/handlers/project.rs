//! Handlers for the `/projects` resource.
//!
//! A project is visible only to its owner; any other caller gets 404.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use openerr_core::api_keys::generate_api_key;
use openerr_core::error::CoreError;
use openerr_core::types::DbId;
use openerr_core::validation::{validate_project_name, validate_source_uri};
use openerr_db::models::project::{CreateProject, Project, ProjectResponse, UpdateProject};
use openerr_db::repositories::ProjectRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub source_uri: String,
}

/// A project together with its plaintext API key. Returned on create and
/// rotate only; the key cannot be recovered afterwards.
#[derive(Debug, Serialize)]
pub struct ProjectWithKey {
    pub project: ProjectResponse,
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct ConnectionCheck {
    pub ok: bool,
    pub message: String,
}

/// POST /api/v1/projects
pub async fn create_project(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectWithKey>>)> {
    let name = input.name.trim();
    let source_uri = input.source_uri.trim();
    validate_project_name(name)?;
    validate_source_uri(source_uri)?;

    let key = generate_api_key();
    let project = ProjectRepo::create(
        &state.pool,
        &CreateProject {
            user_id: auth_user.user_id,
            name: name.to_string(),
            source_uri: source_uri.to_string(),
            api_key_hash: key.hash.clone(),
            key_prefix: key.prefix.clone(),
        },
    )
    .await?;

    tracing::info!(
        user_id = auth_user.user_id,
        project_id = project.id,
        key_prefix = %project.key_prefix,
        "Project created"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ProjectWithKey {
                project: ProjectResponse::from(&project),
                api_key: key.plaintext,
            },
        }),
    ))
}

/// GET /api/v1/projects
pub async fn list_projects(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<ProjectResponse>>>> {
    let projects = ProjectRepo::list_for_user(&state.pool, auth_user.user_id).await?;
    Ok(Json(DataResponse {
        data: projects.iter().map(ProjectResponse::from).collect(),
    }))
}

/// GET /api/v1/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectResponse>>> {
    let project = find_owned_project(&state, auth_user.user_id, id).await?;
    Ok(Json(DataResponse {
        data: ProjectResponse::from(&project),
    }))
}

/// PUT /api/v1/projects/{id}
///
/// Changing `source_uri` drops the cached connection for the old one.
pub async fn update_project(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProject>,
) -> AppResult<Json<DataResponse<ProjectResponse>>> {
    let input = UpdateProject {
        name: input.name.map(|n| n.trim().to_string()),
        source_uri: input.source_uri.map(|u| u.trim().to_string()),
    };
    if let Some(name) = &input.name {
        validate_project_name(name)?;
    }
    if let Some(uri) = &input.source_uri {
        validate_source_uri(uri)?;
    }

    let existing = find_owned_project(&state, auth_user.user_id, id).await?;

    let project = ProjectRepo::update(&state.pool, auth_user.user_id, id, &input)
        .await?
        .ok_or_else(|| project_not_found(id))?;

    if project.source_uri != existing.source_uri {
        state.sources.invalidate(&existing.source_uri).await;
    }

    tracing::info!(user_id = auth_user.user_id, project_id = id, "Project updated");

    Ok(Json(DataResponse {
        data: ProjectResponse::from(&project),
    }))
}

/// DELETE /api/v1/projects/{id}
pub async fn delete_project(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let project = find_owned_project(&state, auth_user.user_id, id).await?;

    if !ProjectRepo::soft_delete(&state.pool, auth_user.user_id, id).await? {
        return Err(project_not_found(id));
    }
    state.sources.invalidate(&project.source_uri).await;

    tracing::info!(user_id = auth_user.user_id, project_id = id, "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/projects/{id}/rotate-key
///
/// The previous key stops working immediately.
pub async fn rotate_key(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectWithKey>>> {
    let key = generate_api_key();
    let project = ProjectRepo::rotate_key(&state.pool, auth_user.user_id, id, &key.hash, &key.prefix)
        .await?
        .ok_or_else(|| project_not_found(id))?;

    tracing::info!(
        user_id = auth_user.user_id,
        project_id = id,
        key_prefix = %project.key_prefix,
        "Project API key rotated"
    );

    Ok(Json(DataResponse {
        data: ProjectWithKey {
            project: ProjectResponse::from(&project),
            api_key: key.plaintext,
        },
    }))
}

/// POST /api/v1/projects/{id}/test-connection
///
/// Always 200 for an owned project; `ok` reports whether the log database
/// answered.
pub async fn test_connection(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ConnectionCheck>>> {
    let project = find_owned_project(&state, auth_user.user_id, id).await?;

    let result = match state.sources.connect(&project.source_uri).await {
        Ok(source) => source.ping().await,
        Err(e) => Err(e),
    };

    let check = match result {
        Ok(()) => ConnectionCheck {
            ok: true,
            message: "Connection successful".to_string(),
        },
        Err(e) => {
            tracing::warn!(project_id = id, error = %e, "Connection test failed");
            ConnectionCheck {
                ok: false,
                message: e.user_message().to_string(),
            }
        }
    };

    Ok(Json(DataResponse { data: check }))
}

pub(crate) async fn find_owned_project(
    state: &AppState,
    user_id: DbId,
    id: DbId,
) -> AppResult<Project> {
    ProjectRepo::find_for_user(&state.pool, user_id, id)
        .await?
        .ok_or_else(|| project_not_found(id))
}

fn project_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Project",
        id,
    })
}
