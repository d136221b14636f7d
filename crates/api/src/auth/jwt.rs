//! Signed dashboard tokens.
//!
//! One HS256 token per sign-in, carried in the `auth_token` cookie or a
//! bearer header. There is no server-side session: logging out expires the
//! cookie and the token lapses on its own.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use openerr_core::types::DbId;
use serde::{Deserialize, Serialize};

/// How the holder proved who they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignInMethod {
    /// Registration or email + password.
    Password,
    /// Password followed by an emailed one-time code.
    Otp,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// The user's id.
    pub sub: DbId,
    pub email: String,
    #[serde(rename = "amr")]
    pub method: SignInMethod,
    /// Expiry, Unix seconds.
    pub exp: i64,
    /// Issued at, Unix seconds.
    pub iat: i64,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub token_expiry_days: i64,
}

const DEFAULT_TOKEN_EXPIRY_DAYS: i64 = 7;

impl JwtConfig {
    /// | Env Var            | Required | Default |
    /// |--------------------|----------|---------|
    /// | `JWT_SECRET`       | **yes**  | --      |
    /// | `JWT_EXPIRY_DAYS`  | no       | `7`     |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is unset or empty, or the lifetime is not a
    /// positive number.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let token_expiry_days: i64 = std::env::var("JWT_EXPIRY_DAYS")
            .unwrap_or_else(|_| DEFAULT_TOKEN_EXPIRY_DAYS.to_string())
            .parse()
            .expect("JWT_EXPIRY_DAYS must be a valid i64");
        assert!(token_expiry_days > 0, "JWT_EXPIRY_DAYS must be positive");

        Self {
            secret,
            token_expiry_days,
        }
    }

    /// Token and cookie lifetime.
    pub fn token_lifetime_secs(&self) -> i64 {
        self.token_expiry_days * 24 * 60 * 60
    }
}

pub fn issue_token(
    user_id: DbId,
    email: &str,
    method: SignInMethod,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        method,
        exp: now + config.token_lifetime_secs(),
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Check signature and expiry, returning the claims.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}
