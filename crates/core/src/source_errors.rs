//! User-facing wording for failures reaching a project's log database.
//!
//! Driver errors are technical ("password authentication failed for user",
//! "relation \"errors\" does not exist"). Dashboards show the mapped message
//! instead. The first case-insensitive substring hit wins.

pub const MSG_CONNECTION_FAILED: &str =
    "Connection to your database failed. Please check if your database is running.";
pub const MSG_CONNECTION_REFUSED: &str =
    "Database connection refused. Please check if your database is running.";
pub const MSG_ACCESS_DENIED: &str =
    "Invalid database credentials. Please check your username and password.";
pub const MSG_NO_LOGS: &str = "No error logs found in your database.";
pub const MSG_INVALID_URI: &str =
    "Invalid database connection URL. Please check your connection string.";
pub const MSG_HOST_NOT_FOUND: &str =
    "Database server not found. Please check your connection details.";
pub const MSG_TIMEOUT: &str = "Connection to database timed out. Please try again.";
pub const MSG_FALLBACK: &str =
    "Unable to connect to your database. Please check your connection details.";

/// Lower-case needle and the message it selects, in match order.
const FRIENDLY_MESSAGES: &[(&str, &str)] = &[
    ("could not connect", MSG_CONNECTION_FAILED),
    ("connection refused", MSG_CONNECTION_REFUSED),
    ("econnrefused", MSG_CONNECTION_REFUSED),
    ("access denied", MSG_ACCESS_DENIED),
    ("password authentication failed", MSG_ACCESS_DENIED),
    ("no pg_hba.conf entry", MSG_ACCESS_DENIED),
    ("eacces", MSG_ACCESS_DENIED),
    ("missing table", MSG_NO_LOGS),
    ("does not exist", MSG_NO_LOGS),
    ("invalid uri", MSG_INVALID_URI),
    ("invalid connection string", MSG_INVALID_URI),
    ("failed to parse", MSG_INVALID_URI),
    ("enotfound", MSG_HOST_NOT_FOUND),
    ("failed to lookup address", MSG_HOST_NOT_FOUND),
    ("name or service not known", MSG_HOST_NOT_FOUND),
    ("timed out", MSG_TIMEOUT),
    ("etimedout", MSG_TIMEOUT),
    ("timeout", MSG_TIMEOUT),
];

pub fn friendly_source_message(technical: &str) -> &'static str {
    let haystack = technical.to_lowercase();
    FRIENDLY_MESSAGES
        .iter()
        .find(|(needle, _)| haystack.contains(needle))
        .map(|(_, message)| *message)
        .unwrap_or(MSG_FALLBACK)
}
