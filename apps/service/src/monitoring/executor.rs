use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use super::checker::{Checker, HttpChecker};
use super::types::{HttpOutcome, MonitorStatus, ProbeResult};

/// Hard upper bound for a single probe
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Diagnostic attached to `blocked` results
pub const BLOCKED_DIAGNOSTIC: &str = "forbidden — target may be blocking automated checks";

/// Monitoring executor - performs and classifies individual probes
pub struct MonitoringExecutor {
    checker: Arc<dyn Checker>,
    timeout: Duration,
}

impl MonitoringExecutor {
    /// Create an executor that probes over HTTP with the fixed timeout
    pub fn new() -> Result<Self> {
        Ok(Self::with_checker(Arc::new(HttpChecker::new(PROBE_TIMEOUT)?), PROBE_TIMEOUT))
    }

    /// Create an executor around any checker
    pub fn with_checker(checker: Arc<dyn Checker>, timeout: Duration) -> Self {
        Self { checker, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe `target` once
    ///
    /// Never fails. A checker that outlives the timeout is cut off here and
    /// the probe is reported as a transport failure.
    pub async fn execute_check(&self, target: &str) -> ProbeResult {
        let dispatched_at = Utc::now();
        let start = Instant::now();

        let outcome = match timeout(self.timeout, self.checker.check(target)).await {
            Ok(outcome) => outcome,
            Err(_) => HttpOutcome::TransportFailure {
                reason: format!("request timed out after {}ms", self.timeout.as_millis()),
            },
        };

        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let (status, status_code, diagnostic) = classify(&outcome);

        ProbeResult { status, status_code, latency_ms, diagnostic, dispatched_at }
    }
}

/// Map a wire outcome onto the status taxonomy
///
/// Rules apply in order: transport failure, 403, [200, 400), everything else.
pub fn classify(outcome: &HttpOutcome) -> (MonitorStatus, u16, Option<String>) {
    match outcome {
        HttpOutcome::TransportFailure { reason } => {
            (MonitorStatus::Down, 0, Some(reason.clone()))
        }
        HttpOutcome::Response { status_code: 403 } => {
            (MonitorStatus::Blocked, 403, Some(BLOCKED_DIAGNOSTIC.to_string()))
        }
        HttpOutcome::Response { status_code } if (200..400).contains(status_code) => {
            (MonitorStatus::Up, *status_code, None)
        }
        HttpOutcome::Response { status_code } => (
            MonitorStatus::Down,
            *status_code,
            Some(format!("received HTTP {status_code}")),
        ),
    }
}
