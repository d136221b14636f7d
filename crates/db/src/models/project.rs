//! Project entity model and DTOs.
//!
//! A project ties an owner to one external log database (`source_uri`) and
//! one ingest API key.

use openerr_core::types::{DbId, Timestamp};
use openerr_core::validation::redact_source_uri;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A project row from the `projects` table.
///
/// Holds the full connection string; use [`ProjectResponse`] for output.
#[derive(Debug, Clone, FromRow)]
pub struct Project {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub api_key_hash: String,
    pub key_prefix: String,
    pub source_uri: String,
    pub last_used_at: Option<Timestamp>,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Project as returned to its owner: password in the URI masked, key hash
/// omitted.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectResponse {
    pub id: DbId,
    pub name: String,
    pub key_prefix: String,
    pub source_uri: String,
    pub last_used_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&Project> for ProjectResponse {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id,
            name: project.name.clone(),
            key_prefix: project.key_prefix.clone(),
            source_uri: redact_source_uri(&project.source_uri),
            last_used_at: project.last_used_at,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

/// Insert DTO. Key material comes from `openerr_core::api_keys`.
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub user_id: DbId,
    pub name: String,
    pub source_uri: String,
    pub api_key_hash: String,
    pub key_prefix: String,
}

/// Patch DTO. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub source_uri: Option<String>,
}
