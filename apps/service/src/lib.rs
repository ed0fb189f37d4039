//! Website uptime monitoring service.
//!
//! Monitors are polled by a single scheduler, each probe is classified as
//! up, down or blocked and appended to a check log, and uptime summaries are
//! computed from the most recent logs on demand.

pub mod config;
pub mod database;
pub mod monitoring;
pub mod orchestrator;
pub mod pool;
