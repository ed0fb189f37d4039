//! Validation of user supplied monitor configuration.
//!
//! Monitors are validated when they are created or edited. The scheduler does
//! not rely on it: a stored interval that is not positive is simply never due.

use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Shortest allowed check interval, in minutes
pub const MIN_INTERVAL_MINUTES: i64 = 1;
/// Longest allowed check interval, in minutes (one day)
pub const MAX_INTERVAL_MINUTES: i64 = 1440;
/// Interval used when the caller does not pick one
pub const DEFAULT_INTERVAL_MINUTES: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("URL cannot be empty")]
    EmptyUrl,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid scheme '{0}'. Must be http or https")]
    InvalidScheme(String),

    #[error("URL must have a valid host")]
    MissingHost,

    #[error("Private/local addresses are not allowed: {0}")]
    PrivateTarget(String),

    #[error("Port 0 is not valid")]
    InvalidPort,

    #[error("Check interval must be between 1 and 1440 minutes, got {0}")]
    IntervalOutOfRange(i64),
}

/// Validate a monitor target URL
///
/// Returns the URL in the normalized form it will be stored and probed in.
pub fn validate_monitor_url(target: &str, allow_private: bool) -> Result<String, ValidationError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }

    let url = Url::parse(target).map_err(|e| {
        if target.contains("://") {
            ValidationError::InvalidUrl(e.to_string())
        } else {
            ValidationError::InvalidUrl("URL must include scheme (http:// or https://)".into())
        }
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(ValidationError::InvalidScheme(other.to_string())),
    }

    let host = url.host_str().filter(|h| !h.is_empty()).ok_or(ValidationError::MissingHost)?;

    if !allow_private && is_private_or_local(host) {
        return Err(ValidationError::PrivateTarget(host.to_string()));
    }

    if url.port() == Some(0) {
        return Err(ValidationError::InvalidPort);
    }

    Ok(url.to_string())
}

/// Validate a check interval, falling back to the default when absent
pub fn validate_check_interval(minutes: Option<i64>) -> Result<i64, ValidationError> {
    let minutes = minutes.unwrap_or(DEFAULT_INTERVAL_MINUTES);
    if (MIN_INTERVAL_MINUTES..=MAX_INTERVAL_MINUTES).contains(&minutes) {
        Ok(minutes)
    } else {
        Err(ValidationError::IntervalOutOfRange(minutes))
    }
}

/// Check if hostname/IP is private or localhost
fn is_private_or_local(host: &str) -> bool {
    // Url keeps brackets around IPv6 literals
    let host = host.trim_start_matches('[').trim_end_matches(']');

    if host.eq_ignore_ascii_case("localhost") || host.ends_with(".localhost") {
        return true;
    }

    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ipv4)) => {
            ipv4.is_private()
                || ipv4.is_loopback()
                || ipv4.is_link_local()
                || ipv4.is_broadcast()
                || ipv4.is_unspecified()
        }
        Ok(IpAddr::V6(ipv6)) => ipv6.is_loopback() || ipv6.is_unspecified() || ipv6.is_multicast(),
        Err(_) => host.ends_with(".local") || host.ends_with(".internal"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_monitor_url() {
        // Valid
        assert_eq!(validate_monitor_url("https://example.com", false).unwrap(), "https://example.com/");
        assert!(validate_monitor_url("http://example.com:8080/status", false).is_ok());
        assert!(validate_monitor_url("  https://example.com  ", false).is_ok());

        // Invalid - private targets
        assert_eq!(
            validate_monitor_url("http://localhost", false),
            Err(ValidationError::PrivateTarget("localhost".into()))
        );
        assert!(validate_monitor_url("http://127.0.0.1", false).is_err());
        assert!(validate_monitor_url("http://192.168.1.1", false).is_err());
        assert!(validate_monitor_url("http://10.0.0.1", false).is_err());
        assert!(validate_monitor_url("http://[::1]/", false).is_err());

        // ...unless explicitly allowed
        assert!(validate_monitor_url("http://127.0.0.1:3000", true).is_ok());

        // Invalid - scheme and shape
        assert_eq!(
            validate_monitor_url("ftp://example.com", false),
            Err(ValidationError::InvalidScheme("ftp".into()))
        );
        assert!(validate_monitor_url("example.com", false).is_err());
        assert_eq!(validate_monitor_url("   ", false), Err(ValidationError::EmptyUrl));
        assert_eq!(validate_monitor_url("http://example.com:0", false), Err(ValidationError::InvalidPort));
    }

    #[test]
    fn test_validate_check_interval() {
        assert_eq!(validate_check_interval(None), Ok(5));
        assert_eq!(validate_check_interval(Some(1)), Ok(1));
        assert_eq!(validate_check_interval(Some(1440)), Ok(1440));

        assert_eq!(validate_check_interval(Some(0)), Err(ValidationError::IntervalOutOfRange(0)));
        assert!(validate_check_interval(Some(-5)).is_err());
        assert!(validate_check_interval(Some(1441)).is_err());
    }

    #[test]
    fn test_private_ip_detection() {
        assert!(is_private_or_local("localhost"));
        assert!(is_private_or_local("127.0.0.1"));
        assert!(is_private_or_local("172.16.0.1"));
        assert!(is_private_or_local("printer.local"));

        assert!(!is_private_or_local("8.8.8.8"));
        assert!(!is_private_or_local("1.1.1.1"));
        assert!(!is_private_or_local("example.com"));
    }
}
