use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::types::MonitorStatus;
use crate::database::{CheckLogEntry, CheckLogStore, StoreError};

/// Number of most recent check logs the uptime figures are computed over
pub const UPTIME_WINDOW: usize = 100;

/// Presentation summary of a monitor's recent health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UptimeSummary {
    /// Percentage of `up` probes in the window, two decimals
    pub uptime_percentage: f64,
    pub last_status: MonitorStatus,
    /// Latency of the most recent probe in milliseconds
    pub last_response_time: Option<u64>,
    /// Number of log entries the figures are based on
    pub total_checks: usize,
}

impl UptimeSummary {
    /// Summarize entries ordered most recent first
    pub fn from_logs(entries: &[CheckLogEntry]) -> Self {
        let up_count = entries.iter().filter(|e| e.status == MonitorStatus::Up).count();
        let total = entries.len();
        let ratio = up_count as f64 / total.max(1) as f64;

        Self {
            uptime_percentage: round_two_places(ratio * 100.0),
            last_status: entries.first().map_or(MonitorStatus::Unknown, |e| e.status),
            last_response_time: entries.first().map(|e| e.response_time),
            total_checks: total,
        }
    }
}

fn round_two_places(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Computes summaries on demand; nothing is cached
pub struct UptimeAggregator {
    logs: Arc<dyn CheckLogStore>,
}

impl UptimeAggregator {
    pub fn new(logs: Arc<dyn CheckLogStore>) -> Self {
        Self { logs }
    }

    /// Summary over the last [`UPTIME_WINDOW`] probes of one monitor
    pub async fn summary(&self, monitor_uuid: Uuid) -> Result<UptimeSummary, StoreError> {
        let entries = self.logs.recent_logs(monitor_uuid, UPTIME_WINDOW).await?;
        Ok(UptimeSummary::from_logs(&entries))
    }

    /// The raw window the summary is computed from
    pub async fn recent_logs(&self, monitor_uuid: Uuid) -> Result<Vec<CheckLogEntry>, StoreError> {
        self.logs.recent_logs(monitor_uuid, UPTIME_WINDOW).await
    }
}
