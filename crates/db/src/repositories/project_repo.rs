//! Repository for the `projects` table.
//!
//! Every owner-facing query is scoped by `user_id`, so another user's
//! project reads as absent. Soft-deleted rows are invisible everywhere.

use openerr_core::types::DbId;
use sqlx::PgPool;

use crate::models::project::{CreateProject, Project, UpdateProject};

const COLUMNS: &str = "id, user_id, name, api_key_hash, key_prefix, source_uri, \
                       last_used_at, deleted_at, created_at, updated_at";

pub struct ProjectRepo;

impl ProjectRepo {
    pub async fn create(pool: &PgPool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (user_id, name, source_uri, api_key_hash, key_prefix)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(input.user_id)
            .bind(&input.name)
            .bind(&input.source_uri)
            .bind(&input.api_key_hash)
            .bind(&input.key_prefix)
            .fetch_one(pool)
            .await
    }

    pub async fn find_for_user(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Newest first.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE user_id = $1 AND deleted_at IS NULL
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Ingest-path lookup by the SHA-256 of a presented API key.
    pub async fn find_by_key_hash(
        pool: &PgPool,
        api_key_hash: &str,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE api_key_hash = $1 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(api_key_hash)
            .fetch_optional(pool)
            .await
    }

    /// Apply the non-`None` fields of `input`. `None` if not found for this user.
    pub async fn update(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                name = COALESCE($3, name),
                source_uri = COALESCE($4, source_uri)
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(user_id)
            .bind(&input.name)
            .bind(&input.source_uri)
            .fetch_optional(pool)
            .await
    }

    /// Replace the key material. The old key stops working immediately.
    pub async fn rotate_key(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
        api_key_hash: &str,
        key_prefix: &str,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET api_key_hash = $3, key_prefix = $4, last_used_at = NULL
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(user_id)
            .bind(api_key_hash)
            .bind(key_prefix)
            .fetch_optional(pool)
            .await
    }

    pub async fn touch_last_used(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE projects SET last_used_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Returns `true` if a live row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, user_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET deleted_at = NOW()
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
