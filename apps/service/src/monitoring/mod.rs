/// Monitoring engine module - decides when monitors are due and probes them
///
/// This module is responsible for:
/// - Executing bounded-timeout HTTP probes and classifying the outcome
/// - Running the tick loop that dispatches due monitors
/// - Validating monitor configuration
/// - Summarizing recent check logs into uptime figures
pub mod checker;
pub mod executor;
pub mod scheduler;
pub mod types;
pub mod uptime;
pub mod validation;

pub use executor::{MonitoringExecutor, PROBE_TIMEOUT};
pub use scheduler::{MonitoringScheduler, SchedulerConfig, SchedulerHandle, TickReport};
pub use types::{MonitorStatus, ProbeResult};
pub use uptime::{UPTIME_WINDOW, UptimeAggregator, UptimeSummary};
