//! Shared tracing setup for the sitewatch binaries.

mod tracing;

pub use ::tracing::level_filters::LevelFilter;

pub use self::tracing::{LogFormat, init_tracing, init_tracing_with};
