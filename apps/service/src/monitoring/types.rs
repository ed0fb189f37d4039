use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Status of a monitoring check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorStatus {
    Up,
    Down,
    Blocked,
    /// Only used by summaries of monitors that were never probed
    Unknown,
}

impl MonitorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorStatus::Up => "up",
            MonitorStatus::Down => "down",
            MonitorStatus::Blocked => "blocked",
            MonitorStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MonitorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(MonitorStatus::Up),
            "down" => Ok(MonitorStatus::Down),
            "blocked" => Ok(MonitorStatus::Blocked),
            "unknown" => Ok(MonitorStatus::Unknown),
            other => Err(format!("unknown monitor status '{other}'")),
        }
    }
}

/// What came back from the wire for a single GET
///
/// Non-2xx responses are still `Response`; only the absence of a response is
/// a `TransportFailure`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpOutcome {
    Response { status_code: u16 },
    TransportFailure { reason: String },
}

/// Classified result of one probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Status of the check (up/down/blocked)
    pub status: MonitorStatus,

    /// HTTP status code, 0 when no response arrived
    pub status_code: u16,

    /// Dispatch to response (or failure) in milliseconds
    pub latency_ms: u64,

    /// Human readable reason for anything that is not a plain `up`
    pub diagnostic: Option<String>,

    /// When the request was dispatched
    pub dispatched_at: DateTime<Utc>,
}

impl ProbeResult {
    pub fn is_up(&self) -> bool {
        self.status == MonitorStatus::Up
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_its_string_form() {
        for status in [
            MonitorStatus::Up,
            MonitorStatus::Down,
            MonitorStatus::Blocked,
            MonitorStatus::Unknown,
        ] {
            assert_eq!(status.to_string().parse::<MonitorStatus>(), Ok(status));
        }
        assert!("degraded".parse::<MonitorStatus>().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&MonitorStatus::Blocked).unwrap(), "\"blocked\"");
    }
}
