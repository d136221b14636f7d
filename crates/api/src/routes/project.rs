//! Route definitions for the `/projects` resource and its log views.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{dashboard, project};
use crate::state::AppState;

/// Routes mounted at `/projects`. All require auth.
///
/// ```text
/// GET    /                          -> list_projects
/// POST   /                          -> create_project
/// GET    /{id}                      -> get_project
/// PUT    /{id}                      -> update_project
/// DELETE /{id}                      -> delete_project
/// POST   /{id}/rotate-key           -> rotate_key
/// POST   /{id}/test-connection      -> test_connection
/// GET    /{id}/errors               -> list_errors
/// GET    /{id}/insights             -> get_insights
/// GET    /{id}/dashboard            -> get_dashboard
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(project::list_projects).post(project::create_project),
        )
        .route(
            "/{id}",
            get(project::get_project)
                .put(project::update_project)
                .delete(project::delete_project),
        )
        .route("/{id}/rotate-key", post(project::rotate_key))
        .route("/{id}/test-connection", post(project::test_connection))
        .route("/{id}/errors", get(dashboard::list_errors))
        .route("/{id}/insights", get(dashboard::get_insights))
        .route("/{id}/dashboard", get(dashboard::get_dashboard))
}
