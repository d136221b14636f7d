use crate::auth::jwt::JwtConfig;
use crate::mail::SmtpConfig;

/// Server configuration loaded from environment variables.
///
/// Everything except `JWT_SECRET` has a default suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Dashboard origins allowed by CORS, from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    pub jwt: JwtConfig,
    /// Adds `Secure` to the auth cookie.
    pub cookie_secure: bool,
    /// Upper bound (and default) for records fetched per dashboard load.
    pub log_fetch_limit: i64,
    pub otp_expiry_mins: i64,
    /// Connect timeout for a project's log database.
    pub source_connect_timeout_secs: u64,
    /// `None` disables OTP email delivery.
    pub smtp: Option<SmtpConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                 |
    /// |-------------------------------|-------------------------|
    /// | `HOST`                        | `0.0.0.0`               |
    /// | `PORT`                        | `3000`                  |
    /// | `CORS_ORIGINS`                | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`        | `30`                    |
    /// | `COOKIE_SECURE`               | `false`                 |
    /// | `LOG_FETCH_LIMIT`             | `1000`                  |
    /// | `OTP_EXPIRY_MINS`             | `5`                     |
    /// | `SOURCE_CONNECT_TIMEOUT_SECS` | `10`                    |
    ///
    /// JWT settings come from [`JwtConfig::from_env`], SMTP settings from
    /// [`SmtpConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let cookie_secure = parse_bool(&std::env::var("COOKIE_SECURE").unwrap_or_default());

        let log_fetch_limit: i64 = std::env::var("LOG_FETCH_LIMIT")
            .unwrap_or_else(|_| "1000".into())
            .parse()
            .expect("LOG_FETCH_LIMIT must be a valid i64");
        assert!(log_fetch_limit > 0, "LOG_FETCH_LIMIT must be positive");

        let otp_expiry_mins: i64 = std::env::var("OTP_EXPIRY_MINS")
            .unwrap_or_else(|_| openerr_core::otp::DEFAULT_OTP_EXPIRY_MINS.to_string())
            .parse()
            .expect("OTP_EXPIRY_MINS must be a valid i64");

        let source_connect_timeout_secs: u64 = std::env::var("SOURCE_CONNECT_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("SOURCE_CONNECT_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            cookie_secure,
            log_fetch_limit,
            otp_expiry_mins,
            source_connect_timeout_secs,
            smtp: SmtpConfig::from_env(),
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            parse_origins(" http://a.test , ,http://b.test,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn bool_parsing() {
        assert!(parse_bool("true"));
        assert!(parse_bool(" TRUE "));
        assert!(parse_bool("1"));
        assert!(!parse_bool(""));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("nope"));
    }
}
