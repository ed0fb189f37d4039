use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::monitoring::types::{MonitorStatus, ProbeResult};

/// Monitor model - a user registered URL with its polling cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitor {
    #[serde(skip)]
    pub id: Option<i64>,
    #[serde(rename = "id")]
    pub uuid: Uuid,
    pub owner_id: String,
    pub url: String,
    pub name: Option<String>,
    /// Minutes between probes. Values below 1 are never due.
    pub check_interval: i64,
    pub is_active: bool,
    pub last_checked: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Monitor {
    /// Create a new, never checked monitor
    pub fn new(owner_id: String, url: String, name: Option<String>, check_interval: i64) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            uuid: Uuid::new_v4(),
            owner_id,
            url,
            name,
            check_interval,
            is_active: true,
            last_checked: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Convert a timestamp to Unix milliseconds for storage
    pub fn timestamp_to_i64(time: DateTime<Utc>) -> i64 {
        time.timestamp_millis()
    }

    /// Convert stored Unix milliseconds back to a timestamp
    pub fn i64_to_timestamp(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).single().unwrap_or_default()
    }
}

/// Partial edit of a monitor; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorUpdate {
    pub url: Option<String>,
    pub name: Option<String>,
    pub check_interval: Option<i64>,
    pub is_active: Option<bool>,
}

impl MonitorUpdate {
    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.name.is_none()
            && self.check_interval.is_none()
            && self.is_active.is_none()
    }

    /// Apply the edit to a monitor in place
    pub fn apply_to(&self, monitor: &mut Monitor) {
        if let Some(url) = &self.url {
            monitor.url = url.clone();
        }
        if let Some(name) = &self.name {
            monitor.name = Some(name.clone());
        }
        if let Some(check_interval) = self.check_interval {
            monitor.check_interval = check_interval;
        }
        if let Some(is_active) = self.is_active {
            monitor.is_active = is_active;
        }
        monitor.updated_at = Utc::now();
    }
}

/// One immutable probe outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckLogEntry {
    #[serde(skip)]
    pub id: Option<i64>,
    pub monitor_id: Uuid,
    pub status: MonitorStatus,
    pub status_code: u16,
    pub response_time: u64,
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl CheckLogEntry {
    /// Build the log entry for a finished probe
    pub fn from_probe(monitor_id: Uuid, probe: &ProbeResult) -> Self {
        Self {
            id: None,
            monitor_id,
            status: probe.status,
            status_code: probe.status_code,
            response_time: probe.latency_ms,
            error: probe.diagnostic.clone(),
            checked_at: probe.dispatched_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_survive_storage_at_millisecond_precision() {
        let now = Utc::now();
        let stored = Monitor::timestamp_to_i64(now);
        assert_eq!(Monitor::i64_to_timestamp(stored).timestamp_millis(), now.timestamp_millis());
    }

    #[test]
    fn update_only_touches_given_fields() {
        let mut monitor = Monitor::new("owner".into(), "https://a.example/".into(), None, 5);
        let update = MonitorUpdate { is_active: Some(false), ..Default::default() };

        update.apply_to(&mut monitor);

        assert!(!monitor.is_active);
        assert_eq!(monitor.url, "https://a.example/");
        assert_eq!(monitor.check_interval, 5);
        assert!(MonitorUpdate::default().is_empty());
        assert!(!update.is_empty());
    }

    #[test]
    fn monitor_serializes_with_public_id() {
        let monitor = Monitor::new("owner".into(), "https://a.example/".into(), Some("A".into()), 5);
        let json = serde_json::to_value(&monitor).unwrap();

        assert_eq!(json["id"], monitor.uuid.to_string());
        assert_eq!(json["checkInterval"], 5);
        assert_eq!(json["isActive"], true);
        assert!(json["lastChecked"].is_null());
    }
}
