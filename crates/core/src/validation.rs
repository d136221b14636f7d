//! Field validation for user-entered values.
//!
//! Every check returns [`CoreError::Validation`] with a message fit to show
//! to the end user.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub const MAX_NAME_LENGTH: usize = 100;

pub const MAX_PROJECT_NAME_LENGTH: usize = 100;

/// Most entries accepted in one ingest request.
pub const MAX_INGEST_BATCH: usize = 100;

pub const MAX_ERROR_TYPE_LENGTH: usize = 200;

pub const MAX_ERROR_MESSAGE_LENGTH: usize = 10_000;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

static SOURCE_URI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^postgres(ql)?://\S+$").expect("valid regex"));

/// `scheme://user:` then the password up to the last `@` before the host.
static URI_PASSWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(postgres(?:ql)?://[^:/@\s]*:)([^\s]*)(@[^@\s]*)$").expect("valid regex")
});

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

pub fn validate_email(email: &str) -> Result<(), CoreError> {
    if !EMAIL_RE.is_match(email) {
        return Err(CoreError::Validation("Invalid email format".to_string()));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), CoreError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}

pub fn validate_display_name(name: &str) -> Result<(), CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("Name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Name exceeds maximum length of {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Lower-case and trim an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

pub fn validate_project_name(name: &str) -> Result<(), CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation(
            "Project name must not be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_PROJECT_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Project name exceeds maximum length of {MAX_PROJECT_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Accepts `postgres://` and `postgresql://` connection strings.
pub fn validate_source_uri(uri: &str) -> Result<(), CoreError> {
    if !SOURCE_URI_RE.is_match(uri.trim()) {
        return Err(CoreError::Validation(
            "Invalid database connection URL. Please check your connection string.".to_string(),
        ));
    }
    Ok(())
}

/// Mask the passwords of a connection string for display and logs.
///
/// Both the userinfo password and any `password` style query parameter
/// are masked: `postgres://app:s3cret@db/logs?sslpassword=k` becomes
/// `postgres://app:****@db/logs?sslpassword=****`. Strings without a
/// password are returned unchanged.
pub fn redact_source_uri(uri: &str) -> String {
    let (base, query) = match uri.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (uri, None),
    };

    let mut redacted = match URI_PASSWORD_RE.captures(base) {
        Some(caps) if !caps[2].is_empty() => {
            // The greedy password group runs to the last `@`, so a host part
            // containing `@` cannot occur.
            format!("{}****{}", &caps[1], &caps[3])
        }
        _ => base.to_string(),
    };

    if let Some(query) = query {
        let params: Vec<String> = query.split('&').map(redact_query_param).collect();
        redacted.push('?');
        redacted.push_str(&params.join("&"));
    }
    redacted
}

/// `password=x`, `sslpassword=x` (any case) keep their key only.
fn redact_query_param(param: &str) -> String {
    match param.split_once('=') {
        Some((key, value))
            if !value.is_empty() && key.to_ascii_lowercase().ends_with("password") =>
        {
            format!("{key}=****")
        }
        _ => param.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Ingest
// ---------------------------------------------------------------------------

pub fn validate_ingest_batch_len(len: usize) -> Result<(), CoreError> {
    if len == 0 {
        return Err(CoreError::Validation(
            "At least one error is required".to_string(),
        ));
    }
    if len > MAX_INGEST_BATCH {
        return Err(CoreError::Validation(format!(
            "At most {MAX_INGEST_BATCH} errors may be sent per request (got {len})"
        )));
    }
    Ok(())
}

/// `index` is the entry's position in the batch, echoed in the message.
pub fn validate_ingest_entry(index: usize, error_type: &str, message: &str) -> Result<(), CoreError> {
    if error_type.trim().is_empty() {
        return Err(CoreError::Validation(format!(
            "errors[{index}].type is required"
        )));
    }
    if error_type.chars().count() > MAX_ERROR_TYPE_LENGTH {
        return Err(CoreError::Validation(format!(
            "errors[{index}].type exceeds maximum length of {MAX_ERROR_TYPE_LENGTH} characters"
        )));
    }
    if message.trim().is_empty() {
        return Err(CoreError::Validation(format!(
            "errors[{index}].message is required"
        )));
    }
    if message.chars().count() > MAX_ERROR_MESSAGE_LENGTH {
        return Err(CoreError::Validation(format!(
            "errors[{index}].message exceeds maximum length of {MAX_ERROR_MESSAGE_LENGTH} characters"
        )));
    }
    Ok(())
}
