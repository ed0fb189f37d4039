use anyhow::Result;
use std::error::Error as _;
use std::time::Duration;

use super::types::HttpOutcome;

/// User agent sent with every probe
pub const USER_AGENT: &str = concat!("sitewatch/", env!("CARGO_PKG_VERSION"));

/// Checker trait for the wire half of a probe
///
/// Implementations never fail: anything that prevents a response from
/// arriving is reported as [`HttpOutcome::TransportFailure`].
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    /// Issue a single GET against `target`
    async fn check(&self, target: &str) -> HttpOutcome;
}

/// HTTP/HTTPS checker backed by a shared reqwest client
pub struct HttpChecker {
    client: reqwest::Client,
}

impl HttpChecker {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Checker for HttpChecker {
    async fn check(&self, target: &str) -> HttpOutcome {
        match self.client.get(target).send().await {
            // The status line is all we need; the body is dropped unread.
            Ok(response) => HttpOutcome::Response { status_code: response.status().as_u16() },
            Err(e) => HttpOutcome::TransportFailure { reason: describe_transport_error(&e) },
        }
    }
}

/// Turn a reqwest error into a short diagnostic
fn describe_transport_error(error: &reqwest::Error) -> String {
    let kind = if error.is_timeout() {
        "request timed out"
    } else if error.is_connect() {
        "connection failed"
    } else if error.is_redirect() {
        "too many redirects"
    } else if error.is_builder() {
        "invalid request"
    } else {
        "request failed"
    };

    // reqwest's own Display hides the interesting part (DNS, refused, TLS)
    // in the source chain.
    let mut detail = None;
    let mut source = error.source();
    while let Some(cause) = source {
        detail = Some(cause.to_string());
        source = cause.source();
    }

    match detail {
        Some(detail) => format!("{kind}: {detail}"),
        None => format!("{kind}: {error}"),
    }
}
