//! Handler for client error reports.
//!
//! Called by the reporting SDK from arbitrary sites, authenticated by the
//! project's API key rather than a user session.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use openerr_core::error::CoreError;
use openerr_core::types::DbId;
use openerr_core::validation::{validate_ingest_batch_len, validate_ingest_entry};
use openerr_db::log_source::NewErrorLog;
use openerr_db::repositories::ProjectRepo;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppResult;
use crate::middleware::api_key::ProjectKey;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub errors: Vec<IngestEntry>,
}

/// One reported error. Missing `type`/`message` deserialize as empty and are
/// rejected with a per-entry message.
#[derive(Debug, Deserialize)]
pub struct IngestEntry {
    #[serde(rename = "type", default)]
    pub error_type: String,
    #[serde(default)]
    pub message: String,
    pub stack: Option<String>,
    pub url: Option<String>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub message: &'static str,
    pub count: u64,
    pub project_id: DbId,
}

/// POST /api/v1/errors
///
/// Validates the whole batch before writing any of it. Records are stamped
/// with the server's clock.
pub async fn ingest_errors(
    State(state): State<AppState>,
    ProjectKey { project }: ProjectKey,
    Json(input): Json<IngestRequest>,
) -> AppResult<Json<IngestResponse>> {
    let entries = to_records(input.errors)?;

    let source = state.sources.connect(&project.source_uri).await?;
    let count = source.insert(&entries).await?;

    ProjectRepo::touch_last_used(&state.pool, project.id).await?;

    tracing::info!(project_id = project.id, count, "Errors ingested");

    Ok(Json(IngestResponse {
        message: "Errors logged successfully",
        count,
        project_id: project.id,
    }))
}

fn to_records(entries: Vec<IngestEntry>) -> Result<Vec<NewErrorLog>, CoreError> {
    validate_ingest_batch_len(entries.len())?;

    let now = Utc::now();
    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            validate_ingest_entry(i, &entry.error_type, &entry.message)?;
            if entry.metadata.as_ref().is_some_and(|m| !m.is_object()) {
                return Err(CoreError::Validation(format!(
                    "errors[{i}].metadata must be an object"
                )));
            }
            Ok(NewErrorLog {
                error_type: entry.error_type,
                message: entry.message,
                stack_trace: entry.stack,
                url: entry.url,
                metadata: entry.metadata,
                timestamp: now,
            })
        })
        .collect()
}
