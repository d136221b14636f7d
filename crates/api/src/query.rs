//! Query parameter types shared by handlers.

use serde::Deserialize;

/// `?limit=` for the log listing.
#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<i64>,
}

impl LogsQuery {
    /// `limit` clamped to `1..=max`; absent means `max`.
    pub fn clamped_limit(&self, max: i64) -> i64 {
        self.limit.map_or(max, |l| l.clamp(1, max))
    }
}
