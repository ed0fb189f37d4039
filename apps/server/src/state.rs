use std::sync::Arc;

use sitewatch_service::database::{DatabaseImpl, MonitorStore};
use sitewatch_service::monitoring::UptimeAggregator;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub monitors: Arc<dyn MonitorStore>,
    pub uptime: Arc<UptimeAggregator>,
    /// Accept monitors pointing at loopback or private networks
    pub allow_private_targets: bool,
}

impl AppState {
    pub fn new(database: Arc<DatabaseImpl>, allow_private_targets: bool) -> Self {
        Self {
            monitors: database.clone(),
            uptime: Arc::new(UptimeAggregator::new(database)),
            allow_private_targets,
        }
    }
}
