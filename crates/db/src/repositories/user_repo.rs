//! Repository for the `users` table.

use openerr_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::user::{CreateUser, User};

const COLUMNS: &str = "id, name, email, password_hash, is_active, last_login_at, \
                       failed_login_count, locked_until, otp_code_hash, otp_expires_at, \
                       created_at, updated_at";

pub struct UserRepo;

impl UserRepo {
    /// Insert a new user. A duplicate email fails on `uq_users_email`.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.password_hash)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Exact match; callers normalize the email first.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Increment the failed login counter and return the new value.
    pub async fn increment_failed_login(pool: &PgPool, id: DbId) -> Result<i32, sqlx::Error> {
        let (count,): (i32,) = sqlx::query_as(
            "UPDATE users SET failed_login_count = failed_login_count + 1
             WHERE id = $1
             RETURNING failed_login_count",
        )
        .bind(id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Lock until `until`. Any outstanding one-time code is discarded.
    pub async fn lock_account(
        pool: &PgPool,
        id: DbId,
        until: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET locked_until = $2, otp_code_hash = NULL, otp_expires_at = NULL
             WHERE id = $1",
        )
            .bind(id)
            .bind(until)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Reset the failure counter, clear any lock and stamp `last_login_at`.
    pub async fn record_successful_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET
                failed_login_count = 0,
                locked_until = NULL,
                last_login_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Store a one-time code hash, replacing any previous code.
    pub async fn set_otp(
        pool: &PgPool,
        id: DbId,
        code_hash: &str,
        expires_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET otp_code_hash = $2, otp_expires_at = $3 WHERE id = $1")
            .bind(id)
            .bind(code_hash)
            .bind(expires_at)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Clear the code only if it is still `code_hash` and unexpired.
    ///
    /// Returns `true` for exactly one caller when several race on the same
    /// code.
    pub async fn consume_otp(
        pool: &PgPool,
        id: DbId,
        code_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let consumed: Option<(DbId,)> = sqlx::query_as(
            "UPDATE users SET otp_code_hash = NULL, otp_expires_at = NULL
             WHERE id = $1 AND otp_code_hash = $2 AND otp_expires_at > NOW()
             RETURNING id",
        )
        .bind(id)
        .bind(code_hash)
        .fetch_optional(pool)
        .await?;
        Ok(consumed.is_some())
    }

    /// Returns `true` if a code was present.
    pub async fn clear_otp(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET otp_code_hash = NULL, otp_expires_at = NULL
             WHERE id = $1 AND otp_code_hash IS NOT NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
