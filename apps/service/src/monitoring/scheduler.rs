use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use super::executor::MonitoringExecutor;
use super::types::ProbeResult;
use crate::database::{CheckLogEntry, CheckLogStore, Monitor, MonitorStore, StoreError};

/// Scheduler tuning
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between two ticks
    pub tick: Duration,
    /// Upper bound of probes in flight during one tick
    pub max_concurrent_probes: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { tick: Duration::from_secs(60), max_concurrent_probes: 16 }
    }
}

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Active monitors seen
    pub active: usize,
    /// Monitors that were due and got probed
    pub probed: usize,
    /// Probes whose outcome could not be stored
    pub store_failures: usize,
}

/// Whether `monitor` should be probed at `now`
///
/// Never-checked monitors are always due. A non-positive or out of range
/// interval is never due so a corrupt row cannot turn into a probe every tick.
pub fn is_due(monitor: &Monitor, now: DateTime<Utc>) -> bool {
    if !monitor.is_active || monitor.check_interval <= 0 {
        return false;
    }

    // Intervals too large for a duration are as corrupt as negative ones.
    let Some(threshold) = chrono::Duration::try_minutes(monitor.check_interval) else {
        return false;
    };

    match monitor.last_checked {
        None => true,
        Some(last_checked) => now.signed_duration_since(last_checked) >= threshold,
    }
}

/// Monitoring scheduler - one timer, a due check per monitor
pub struct MonitoringScheduler {
    monitors: Arc<dyn MonitorStore>,
    logs: Arc<dyn CheckLogStore>,
    executor: Arc<MonitoringExecutor>,
    config: SchedulerConfig,
}

impl MonitoringScheduler {
    /// Create a new monitoring scheduler
    pub fn new(
        monitors: Arc<dyn MonitorStore>,
        logs: Arc<dyn CheckLogStore>,
        executor: Arc<MonitoringExecutor>,
        config: SchedulerConfig,
    ) -> Self {
        Self { monitors, logs, executor, config }
    }

    /// Run one tick at `now`
    ///
    /// Only listing the monitors can fail the tick. Problems storing a single
    /// probe are logged and counted in the report.
    pub async fn run_tick(&self, now: DateTime<Utc>) -> Result<TickReport, StoreError> {
        let monitors = self.monitors.list_active_monitors().await?;
        let active = monitors.len();

        let due: Vec<Monitor> = monitors.into_iter().filter(|m| is_due(m, now)).collect();
        debug!(active, due = due.len(), "Tick started");

        let outcomes: Vec<Result<(), StoreError>> = stream::iter(due)
            .map(|monitor| {
                let monitors = Arc::clone(&self.monitors);
                let logs = Arc::clone(&self.logs);
                let executor = Arc::clone(&self.executor);
                async move {
                    probe_and_record(monitors.as_ref(), logs.as_ref(), &executor, monitor, now).await
                }
            })
            .buffer_unordered(self.config.max_concurrent_probes.max(1))
            .collect()
            .await;

        let probed = outcomes.len();
        let store_failures = outcomes.iter().filter(|r| r.is_err()).count();

        Ok(TickReport { active, probed, store_failures })
    }

    /// Spawn the timer loop
    ///
    /// The first tick fires immediately. On shutdown the tick in progress is
    /// allowed to finish; every probe in it is bounded by the probe timeout.
    pub fn start(self: Arc<Self>) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let scheduler = self;

        let task = tokio::spawn(async move {
            let mut timer = interval(scheduler.config.tick);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(
                tick_seconds = scheduler.config.tick.as_secs(),
                max_concurrent_probes = scheduler.config.max_concurrent_probes,
                "Scheduler started"
            );

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        match scheduler.run_tick(Utc::now()).await {
                            Ok(report) if report.probed > 0 || report.store_failures > 0 => info!(
                                active = report.active,
                                probed = report.probed,
                                store_failures = report.store_failures,
                                "Tick finished"
                            ),
                            Ok(report) => debug!(active = report.active, "Tick finished, nothing due"),
                            Err(e) => warn!("Tick failed, retrying next tick: {}", e),
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Scheduler stopped");
        });

        SchedulerHandle { shutdown_tx, task }
    }
}

/// Probe one monitor, append its log entry and advance `last_checked`
///
/// `last_checked` moves to the tick time whatever the probe outcome, so a
/// failing site keeps its cadence. When the log entry cannot be stored
/// `last_checked` is left alone and the monitor is retried next tick.
/// A monitor deleted while its probe was in flight is skipped.
async fn probe_and_record(
    monitors: &dyn MonitorStore,
    logs: &dyn CheckLogStore,
    executor: &MonitoringExecutor,
    monitor: Monitor,
    tick_at: DateTime<Utc>,
) -> Result<(), StoreError> {
    let probe = executor.execute_check(&monitor.url).await;
    log_probe(&monitor, &probe);

    match monitors.get_monitor(monitor.uuid).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            debug!(monitor = %monitor.uuid, "Monitor deleted during probe, result dropped");
            return Ok(());
        }
        Err(e) => {
            error!(monitor = %monitor.uuid, "Failed to look up monitor: {}", e);
            return Err(e);
        }
    }

    let entry = CheckLogEntry::from_probe(monitor.uuid, &probe);
    if let Err(e) = logs.append_log(&entry).await {
        error!(monitor = %monitor.uuid, "Failed to save check log: {}", e);
        return Err(e);
    }

    match monitors.update_last_checked(monitor.uuid, tick_at).await {
        Ok(()) => Ok(()),
        // lost the race with a delete; retention drops the orphaned entry
        Err(StoreError::NotFound) => {
            debug!(monitor = %monitor.uuid, "Monitor deleted during probe");
            Ok(())
        }
        Err(e) => {
            error!(monitor = %monitor.uuid, "Failed to update last checked time: {}", e);
            Err(e)
        }
    }
}

fn log_probe(monitor: &Monitor, probe: &ProbeResult) {
    info!(
        monitor = %monitor.uuid,
        url = %monitor.url,
        status = %probe.status,
        code = probe.status_code,
        latency_ms = probe.latency_ms,
        "Probe finished"
    );
    if let Some(diagnostic) = &probe.diagnostic {
        warn!(monitor = %monitor.uuid, "{}", diagnostic);
    }
}

/// Owner handle of a running scheduler loop
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the loop to stop and wait for it
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            error!("Scheduler task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
