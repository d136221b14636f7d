//! Read side of a project's log database: raw records, insights, and the
//! combined dashboard payload.
//!
//! Records are fetched fresh on every request and aggregated in memory.

use axum::extract::{Path, Query, State};
use axum::Json;
use openerr_core::insights::{aggregate, error_type_label, ErrorInsights};
use openerr_core::log_record::ErrorLogRecord;
use openerr_core::severity::{classify, SeverityLevel};
use openerr_core::source_errors::MSG_NO_LOGS;
use openerr_core::types::DbId;
use openerr_db::log_source::LogSourceError;
use openerr_db::models::project::Project;
use serde::Serialize;

use crate::error::AppResult;
use crate::handlers::project::find_owned_project;
use crate::middleware::auth::AuthUser;
use crate::query::LogsQuery;
use crate::response::DataResponse;
use crate::state::AppState;

/// A record as shown in the log table, with its badge.
#[derive(Debug, Serialize)]
pub struct LogView {
    #[serde(flatten)]
    pub record: ErrorLogRecord,
    pub severity: SeverityLevel,
}

impl From<ErrorLogRecord> for LogView {
    fn from(record: ErrorLogRecord) -> Self {
        let severity = classify(error_type_label(&record));
        Self { record, severity }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub insights: ErrorInsights,
    pub logs: Vec<LogView>,
    /// Set when there is nothing to show.
    pub notice: Option<&'static str>,
}

/// GET /api/v1/projects/{id}/errors?limit=
pub async fn list_errors(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
    Query(params): Query<LogsQuery>,
) -> AppResult<Json<DataResponse<Vec<LogView>>>> {
    let project = find_owned_project(&state, auth_user.user_id, id).await?;
    let limit = params.clamped_limit(state.config.log_fetch_limit);

    let records = fetch_records(&state, &project, limit).await?;

    Ok(Json(DataResponse {
        data: records.into_iter().map(LogView::from).collect(),
    }))
}

/// GET /api/v1/projects/{id}/insights
pub async fn get_insights(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ErrorInsights>>> {
    let project = find_owned_project(&state, auth_user.user_id, id).await?;
    let records = fetch_records(&state, &project, state.config.log_fetch_limit).await?;

    Ok(Json(DataResponse {
        data: aggregate(&records),
    }))
}

/// GET /api/v1/projects/{id}/dashboard
///
/// Insights and logs computed from a single fetch.
pub async fn get_dashboard(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DashboardResponse>>> {
    let project = find_owned_project(&state, auth_user.user_id, id).await?;
    let records = fetch_records(&state, &project, state.config.log_fetch_limit).await?;

    let insights = aggregate(&records);
    let notice = records.is_empty().then_some(MSG_NO_LOGS);

    Ok(Json(DataResponse {
        data: DashboardResponse {
            insights,
            logs: records.into_iter().map(LogView::from).collect(),
            notice,
        },
    }))
}

/// GET /api/v1/severity/{error_type}
pub async fn get_severity(Path(error_type): Path<String>) -> Json<DataResponse<SeverityLevel>> {
    Json(DataResponse {
        data: classify(&error_type),
    })
}

/// Newest-first records from the project's log database. A database that has
/// never received an error (no `errors` table yet) reads as empty.
async fn fetch_records(
    state: &AppState,
    project: &Project,
    limit: i64,
) -> AppResult<Vec<ErrorLogRecord>> {
    let source = state.sources.connect(&project.source_uri).await?;

    let docs = match source.fetch_recent(limit).await {
        Ok(docs) => docs,
        Err(LogSourceError::MissingTable) => {
            tracing::debug!(project_id = project.id, "Log table missing, treating as empty");
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };

    let records = docs
        .iter()
        .map(ErrorLogRecord::from_document)
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(project_id = project.id, count = records.len(), "Fetched error logs");
    Ok(records)
}
