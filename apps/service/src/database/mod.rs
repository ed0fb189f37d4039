/// Database abstraction layer
///
/// Monitors and their check logs live in a local LibSQL database reached
/// through a deadpool connection pool. The rest of the crate only sees the
/// [`MonitorStore`] and [`CheckLogStore`] traits.

pub mod error;
pub mod migrations;
pub mod models;
pub mod repository;

pub use error::StoreError;
pub use models::{CheckLogEntry, Monitor, MonitorUpdate};
pub use repository::{CheckLogStore, DatabaseImpl, MonitorStore};

use anyhow::Result;

use crate::pool::{LibsqlPool, build_pool};

/// Initialize database with schema
pub async fn initialize_database(conn: &libsql::Connection) -> Result<()> {
    migrations::run_migrations(conn).await
}

/// Open (or create) the database file, migrate it, and return a pool
pub async fn open_database(path: &str) -> Result<LibsqlPool> {
    let pool = build_pool(path).await?;
    let conn = pool.get().await?;
    initialize_database(&conn).await?;
    Ok(pool)
}
