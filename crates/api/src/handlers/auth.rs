//! Handlers for the `/auth` resource.
//!
//! Two ways in: email + password (`login`), or a password check followed by
//! an emailed one-time code (`verify-credentials`, `otp/send`, `otp/verify`).
//! Every successful sign-in returns a token in the body and sets the
//! `auth_token` cookie.
//!
//! Password failures and wrong codes share one counter; reaching
//! `MAX_FAILED_ATTEMPTS` locks the account and discards any outstanding
//! code.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use openerr_core::error::CoreError;
use openerr_core::otp::{check_otp, hash_otp, issue_otp, OtpCheck};
use openerr_core::validation::{
    normalize_email, validate_display_name, validate_email, validate_password,
};
use openerr_db::models::project::ProjectResponse;
use openerr_db::models::user::{CreateUser, User, UserResponse};
use openerr_db::repositories::{ProjectRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::auth::cookie::{auth_cookie, clear_auth_cookie};
use crate::auth::jwt::{issue_token, SignInMethod};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Consecutive failed password or code checks before the account is locked.
const MAX_FAILED_ATTEMPTS: i32 = 5;

const LOCK_DURATION_MINS: i64 = 15;

const MSG_BAD_CREDENTIALS: &str = "Invalid email or password";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Body for `login`, `verify-credentials` and `otp/send`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
    pub signed_in_with: SignInMethod,
    pub projects: Vec<ProjectResponse>,
}

/// Auth response plus the `Set-Cookie` header carrying the token.
type SignedIn = ([(axum::http::HeaderName, String); 1], Json<AuthResponse>);

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, SignedIn)> {
    let name = input.name.trim();
    let email = normalize_email(&input.email);
    validate_display_name(name)?;
    validate_email(&email)?;
    validate_password(&input.password)?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    // A duplicate email surfaces as a 409 from the unique index.
    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            name: name.to_string(),
            email,
            password_hash,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "User registered");

    let signed_in = sign_in(&state, &user, SignInMethod::Password)?;
    Ok((StatusCode::CREATED, signed_in))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<SignedIn> {
    let user = check_password(&state, &input.email, &input.password).await?;

    UserRepo::record_successful_login(&state.pool, user.id).await?;
    tracing::info!(user_id = user.id, "User logged in");

    sign_in(&state, &user, SignInMethod::Password)
}

/// POST /api/v1/auth/verify-credentials
///
/// First step of the one-time-code login: checks the password without
/// issuing tokens.
pub async fn verify_credentials(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = check_password(&state, &input.email, &input.password).await?;
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// POST /api/v1/auth/otp/send
///
/// Re-checks the password, then issues a fresh code (replacing any
/// outstanding one) and emails it.
pub async fn send_otp(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<MessageResponse>> {
    let user = check_password(&state, &input.email, &input.password).await?;

    let otp = issue_otp(Utc::now(), state.config.otp_expiry_mins);
    UserRepo::set_otp(&state.pool, user.id, &otp.hash, otp.expires_at).await?;

    match &state.mailer {
        Some(mailer) => {
            mailer
                .send_otp(&user.email, &otp.code, state.config.otp_expiry_mins)
                .await
                .map_err(|e| AppError::InternalError(format!("Failed to send OTP: {e}")))?;
            tracing::info!(user_id = user.id, "OTP sent");
        }
        None => {
            tracing::warn!(user_id = user.id, "SMTP not configured, OTP email skipped");
        }
    }

    Ok(Json(MessageResponse {
        message: "OTP sent successfully",
    }))
}

/// POST /api/v1/auth/otp/verify
///
/// A code is single-use: success or expiry clears it. A wrong code counts
/// as a failed sign-in.
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(input): Json<VerifyOtpRequest>,
) -> AppResult<SignedIn> {
    let user = UserRepo::find_by_email(&state.pool, &normalize_email(&input.email))
        .await?
        .ok_or_else(|| AppError::BadRequest(OtpCheck::Mismatch.message().into()))?;

    ensure_active(&user)?;
    ensure_unlocked(&user)?;

    let check = check_otp(
        user.otp_code_hash.as_deref(),
        user.otp_expires_at,
        &input.otp,
        Utc::now(),
    );

    match check {
        OtpCheck::Valid => {}
        OtpCheck::Expired => {
            UserRepo::clear_otp(&state.pool, user.id).await?;
            return Err(AppError::BadRequest(check.message().into()));
        }
        OtpCheck::Missing => {
            return Err(AppError::BadRequest(check.message().into()));
        }
        OtpCheck::Mismatch => {
            tracing::debug!(user_id = user.id, "OTP rejected");
            record_failed_attempt(&state, &user).await?;
            return Err(AppError::BadRequest(check.message().into()));
        }
    }

    // A concurrent verify of the same code may have won the race.
    if !UserRepo::consume_otp(&state.pool, user.id, &hash_otp(input.otp.trim())).await? {
        return Err(AppError::BadRequest(OtpCheck::Missing.message().into()));
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;
    tracing::info!(user_id = user.id, "User logged in with OTP");

    sign_in(&state, &user, SignInMethod::Otp)
}

/// POST /api/v1/auth/logout
///
/// Expire the cookie. The token itself stays valid until it lapses.
pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<(StatusCode, [(axum::http::HeaderName, String); 1])> {
    tracing::info!(user_id = auth_user.user_id, "User logged out");

    Ok((
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, clear_auth_cookie(state.config.cookie_secure))],
    ))
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<MeResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    let projects = ProjectRepo::list_for_user(&state.pool, user.id).await?;

    Ok(Json(DataResponse {
        data: MeResponse {
            user: UserResponse::from(&user),
            signed_in_with: auth_user.method,
            projects: projects.iter().map(ProjectResponse::from).collect(),
        },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Password check with lockout. Shared by `login`, `verify-credentials` and
/// `otp/send`.
///
/// Unknown email and wrong password produce the same 401.
async fn check_password(state: &AppState, email: &str, password: &str) -> AppResult<User> {
    let user = UserRepo::find_by_email(&state.pool, &normalize_email(email))
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized(MSG_BAD_CREDENTIALS.into())))?;

    ensure_active(&user)?;
    ensure_unlocked(&user)?;

    let password_valid = verify_password(password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        record_failed_attempt(state, &user).await?;
        return Err(AppError::Core(CoreError::Unauthorized(
            MSG_BAD_CREDENTIALS.into(),
        )));
    }

    Ok(user)
}

/// Count a failed password or code check, locking at the threshold.
async fn record_failed_attempt(state: &AppState, user: &User) -> AppResult<()> {
    let failures = UserRepo::increment_failed_login(&state.pool, user.id).await?;
    if failures >= MAX_FAILED_ATTEMPTS {
        let until = Utc::now() + chrono::Duration::minutes(LOCK_DURATION_MINS);
        UserRepo::lock_account(&state.pool, user.id, until).await?;
        tracing::warn!(user_id = user.id, failures, "Account locked after failed sign-ins");
    }
    Ok(())
}

fn ensure_unlocked(user: &User) -> AppResult<()> {
    match user.locked_until {
        Some(until) if until > Utc::now() => Err(AppError::Core(CoreError::Forbidden(
            "Account is temporarily locked. Try again later.".into(),
        ))),
        _ => Ok(()),
    }
}

fn ensure_active(user: &User) -> AppResult<()> {
    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }
    Ok(())
}

/// Issue a token and build the response with its cookie.
fn sign_in(state: &AppState, user: &User, method: SignInMethod) -> AppResult<SignedIn> {
    let jwt = &state.config.jwt;

    let access_token = issue_token(user.id, &user.email, method, jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let expires_in = jwt.token_lifetime_secs();
    let cookie = auth_cookie(&access_token, expires_in, state.config.cookie_secure);

    Ok((
        [(SET_COOKIE, cookie)],
        Json(AuthResponse {
            access_token,
            expires_in,
            user: UserResponse::from(user),
        }),
    ))
}
