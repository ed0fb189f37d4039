//! Automatic retention of check logs.
//!
//! Logs only feed the uptime window, so anything older than the newest
//! `keep_last_per_monitor` entries of a monitor can go. Cleanup runs
//! periodically as a background task and also clears logs of deleted
//! monitors.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::database::{CheckLogStore, StoreError};
use crate::monitoring::UPTIME_WINDOW;

/// Retention policy for check logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Log entries kept per monitor
    pub keep_last_per_monitor: usize,
    /// Time between two cleanup runs
    pub cleanup_interval: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { keep_last_per_monitor: 1000, cleanup_interval: Duration::from_secs(3600) }
    }
}

impl RetentionPolicy {
    /// Entries actually kept; the uptime window is always preserved
    pub fn effective_keep(&self) -> usize {
        self.keep_last_per_monitor.max(UPTIME_WINDOW)
    }
}

/// Cleanup manager for old check logs
pub struct RetentionCleanup {
    logs: Arc<dyn CheckLogStore>,
    policy: RetentionPolicy,
}

impl RetentionCleanup {
    /// Create a new retention cleanup manager
    pub fn new(logs: Arc<dyn CheckLogStore>, policy: RetentionPolicy) -> Self {
        Self { logs, policy }
    }

    /// Run one cleanup pass, returning the number of deleted entries
    pub async fn cleanup_old_logs(&self) -> Result<u64, StoreError> {
        let keep = self.policy.effective_keep();
        debug!(keep, "Starting retention cleanup");

        let deleted = self.logs.prune_logs(keep).await?;
        if deleted > 0 {
            info!("Retention cleanup completed: {} check logs deleted", deleted);
        }

        Ok(deleted)
    }

    /// Start background cleanup task, stopped through `shutdown`
    pub fn start_periodic_cleanup(
        self,
        mut shutdown: watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.policy.cleanup_interval);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = self.cleanup_old_logs().await {
                            warn!("Periodic retention cleanup failed: {}", e);
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            debug!("Retention cleanup stopped");
        })
    }
}
