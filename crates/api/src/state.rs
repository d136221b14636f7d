use std::sync::Arc;

use openerr_db::log_source::LogSourceConnector;

use crate::config::ServerConfig;
use crate::mail::OtpMailer;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// The service's own database.
    pub pool: openerr_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Resolves a project's `source_uri` to its log database.
    pub sources: Arc<dyn LogSourceConnector>,
    /// `None` when SMTP is not configured.
    pub mailer: Option<Arc<dyn OtpMailer>>,
}
