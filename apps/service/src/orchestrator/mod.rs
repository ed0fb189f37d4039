/// Orchestrator module - coordinates all components
///
/// The orchestrator owns the lifecycle of the background work:
/// - Migrates the database and wires the stores into the scheduler
/// - Runs the polling scheduler on its own task
/// - Runs the check log retention cleanup on another
///
/// Dropping the returned handle does not stop anything; call
/// [`OrchestratorHandle::shutdown`].
pub mod retention;

#[cfg(test)]
mod tests;

pub use retention::{RetentionCleanup, RetentionPolicy};

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::Config;
use crate::database::{CheckLogStore, DatabaseImpl, MonitorStore, initialize_database};
use crate::monitoring::{MonitoringExecutor, MonitoringScheduler, SchedulerConfig, SchedulerHandle};
use crate::pool::LibsqlPool;

/// Main orchestrator for the monitoring service
pub struct Orchestrator {
    monitors: Arc<dyn MonitorStore>,
    logs: Arc<dyn CheckLogStore>,
    executor: Arc<MonitoringExecutor>,
    scheduler_config: SchedulerConfig,
    retention_policy: RetentionPolicy,
}

impl Orchestrator {
    /// Migrate the database and start every background task
    pub async fn start(config: &Config, pool: LibsqlPool) -> Result<OrchestratorHandle> {
        let orchestrator = Self::new(config, pool).await?;
        Ok(orchestrator.run())
    }

    /// Create a new orchestrator instance
    async fn new(config: &Config, pool: LibsqlPool) -> Result<Self> {
        // Get database connection for initialization
        let conn = pool.get().await?;

        info!("Initializing database schema...");
        initialize_database(&conn).await?;
        drop(conn);

        let database = Arc::new(DatabaseImpl::new_from_pool(pool));
        let executor = Arc::new(MonitoringExecutor::new()?);

        let retention_policy = RetentionPolicy {
            keep_last_per_monitor: config.keep_last_per_monitor(),
            cleanup_interval: Duration::from_secs(config.retention.cleanup_interval_seconds),
        };

        Ok(Self::with_parts(
            database.clone(),
            database,
            executor,
            config.scheduler_config(),
            retention_policy,
        ))
    }

    /// Assemble an orchestrator from already built parts
    pub fn with_parts(
        monitors: Arc<dyn MonitorStore>,
        logs: Arc<dyn CheckLogStore>,
        executor: Arc<MonitoringExecutor>,
        scheduler_config: SchedulerConfig,
        retention_policy: RetentionPolicy,
    ) -> Self {
        Self { monitors, logs, executor, scheduler_config, retention_policy }
    }

    /// Spawn the scheduler and the retention cleanup
    pub fn run(self) -> OrchestratorHandle {
        info!("Starting sitewatch orchestrator...");

        let scheduler = Arc::new(MonitoringScheduler::new(
            self.monitors,
            self.logs.clone(),
            self.executor,
            self.scheduler_config,
        ));
        let scheduler = scheduler.start();

        let (retention_tx, retention_rx) = watch::channel(false);
        let retention = RetentionCleanup::new(self.logs, self.retention_policy)
            .start_periodic_cleanup(retention_rx);

        info!("Orchestrator running");
        OrchestratorHandle { scheduler, retention_tx, retention }
    }
}

/// Handle to the running background tasks
pub struct OrchestratorHandle {
    scheduler: SchedulerHandle,
    retention_tx: watch::Sender<bool>,
    retention: JoinHandle<()>,
}

impl OrchestratorHandle {
    /// Stop the background tasks; the tick in progress finishes first
    pub async fn shutdown(self) {
        info!("Shutting down orchestrator...");

        let _ = self.retention_tx.send(true);
        self.scheduler.stop().await;
        if let Err(e) = self.retention.await {
            error!("Retention task ended abnormally: {}", e);
        }

        info!("Orchestrator stopped");
    }

    pub fn is_finished(&self) -> bool {
        self.scheduler.is_finished() && self.retention.is_finished()
    }
}
