use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use openerr_core::validation::redact_source_uri;
use tokio::sync::RwLock;

use super::{LogSource, LogSourceConnector, LogSourceError, PgLogSource};

/// Process-wide cache of project log-database pools, keyed by connection
/// string.
///
/// A pool is opened on first use. Before a cached pool is handed out it is
/// pinged; a pool that fails the ping is closed, evicted and reopened.
pub struct PgSourceCache {
    entries: RwLock<HashMap<String, PgLogSource>>,
    connect_timeout: Duration,
}

impl PgSourceCache {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            connect_timeout,
        }
    }

    /// Number of pools currently held.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn cached(&self, uri: &str) -> Option<PgLogSource> {
        self.entries.read().await.get(uri).cloned()
    }

    async fn evict(&self, uri: &str) -> bool {
        let removed = self.entries.write().await.remove(uri);
        match removed {
            Some(source) => {
                source.close().await;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl LogSourceConnector for PgSourceCache {
    async fn connect(&self, uri: &str) -> Result<Arc<dyn LogSource>, LogSourceError> {
        if let Some(source) = self.cached(uri).await {
            match source.ping().await {
                Ok(()) => return Ok(Arc::new(source)),
                Err(e) => {
                    tracing::warn!(
                        uri = %redact_source_uri(uri),
                        error = %e,
                        "Cached log source failed health check, reconnecting"
                    );
                    self.evict(uri).await;
                }
            }
        }

        let source = PgLogSource::connect(uri, self.connect_timeout).await?;

        let mut entries = self.entries.write().await;
        // Another request may have connected while this one was dialing.
        let source = entries.entry(uri.to_string()).or_insert(source).clone();
        tracing::info!(
            uri = %redact_source_uri(uri),
            pools = entries.len(),
            "Log source connected"
        );

        Ok(Arc::new(source))
    }

    async fn invalidate(&self, uri: &str) -> bool {
        let evicted = self.evict(uri).await;
        if evicted {
            tracing::debug!(uri = %redact_source_uri(uri), "Log source evicted");
        }
        evicted
    }
}
