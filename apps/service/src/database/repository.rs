use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Row, params};
use uuid::Uuid;

use super::error::StoreError;
use super::models::{CheckLogEntry, Monitor, MonitorUpdate};
use crate::pool::{LibsqlManager, LibsqlPool};

/// Keyed store of monitor configurations
#[async_trait]
pub trait MonitorStore: Send + Sync {
    /// Get all monitors with `is_active` set
    async fn list_active_monitors(&self) -> Result<Vec<Monitor>, StoreError>;

    /// Record the time of the last probe
    async fn update_last_checked(
        &self,
        monitor_uuid: Uuid,
        checked_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Insert a new monitor; `Conflict` if the owner already watches the URL
    async fn create_monitor(&self, monitor: &Monitor) -> Result<Monitor, StoreError>;

    /// Get a monitor by UUID regardless of owner
    async fn get_monitor(&self, monitor_uuid: Uuid) -> Result<Option<Monitor>, StoreError>;

    /// Get a monitor by UUID if it belongs to `owner_id`
    async fn get_monitor_for_owner(
        &self,
        monitor_uuid: Uuid,
        owner_id: &str,
    ) -> Result<Option<Monitor>, StoreError>;

    /// All monitors of one owner, oldest first
    async fn list_monitors_for_owner(&self, owner_id: &str) -> Result<Vec<Monitor>, StoreError>;

    /// Apply a user edit; `Ok(None)` if the monitor is not the owner's
    async fn update_monitor(
        &self,
        monitor_uuid: Uuid,
        owner_id: &str,
        update: &MonitorUpdate,
    ) -> Result<Option<Monitor>, StoreError>;

    /// Delete a monitor and its check logs; `false` if nothing matched
    async fn delete_monitor(&self, monitor_uuid: Uuid, owner_id: &str) -> Result<bool, StoreError>;
}

/// Append-only history of probe outcomes
#[async_trait]
pub trait CheckLogStore: Send + Sync {
    /// Append one entry, returning its row id
    async fn append_log(&self, entry: &CheckLogEntry) -> Result<i64, StoreError>;

    /// Most recent entries first
    async fn recent_logs(
        &self,
        monitor_uuid: Uuid,
        limit: usize,
    ) -> Result<Vec<CheckLogEntry>, StoreError>;

    /// Drop everything but the newest `keep_last` entries of each monitor,
    /// along with entries whose monitor no longer exists
    async fn prune_logs(&self, keep_last: usize) -> Result<u64, StoreError>;
}

const MONITOR_COLUMNS: &str = "id, uuid, owner_id, url, name, check_interval, is_active, \
                               last_checked, created_at, updated_at";

const LOG_COLUMNS: &str =
    "id, monitor_uuid, status, status_code, response_time_ms, error_message, checked_at";

/// LibSQL implementation of both stores
pub struct DatabaseImpl {
    pool: LibsqlPool,
}

impl DatabaseImpl {
    /// Create a new database instance from a pool
    pub fn new_from_pool(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    /// Get a connection from the pool
    async fn get_conn(&self) -> Result<deadpool::managed::Object<LibsqlManager>, StoreError> {
        Ok(self.pool.get().await?)
    }

    async fn query_monitors(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Monitor>, StoreError> {
        let conn = self.get_conn().await?;
        let mut rows = conn.query(sql, params).await?;
        let mut monitors = Vec::new();

        while let Some(row) = rows.next().await? {
            monitors.push(monitor_from_row(&row)?);
        }

        Ok(monitors)
    }

    /// Whether another monitor of `owner_id` already uses `url`
    async fn url_taken(
        &self,
        owner_id: &str,
        url: &str,
        except: Option<Uuid>,
    ) -> Result<bool, StoreError> {
        let conn = self.get_conn().await?;
        let except = except.map(|u| u.to_string()).unwrap_or_default();
        let mut rows = conn
            .query(
                "SELECT 1 FROM monitors WHERE owner_id = ? AND url = ? AND uuid != ? LIMIT 1",
                params![owner_id, url, except],
            )
            .await?;

        Ok(rows.next().await?.is_some())
    }
}

#[async_trait]
impl MonitorStore for DatabaseImpl {
    async fn list_active_monitors(&self) -> Result<Vec<Monitor>, StoreError> {
        let sql = format!("SELECT {MONITOR_COLUMNS} FROM monitors WHERE is_active = 1 ORDER BY id");
        self.query_monitors(&sql, ()).await
    }

    async fn update_last_checked(
        &self,
        monitor_uuid: Uuid,
        checked_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let conn = self.get_conn().await?;
        let changed = conn
            .execute(
                "UPDATE monitors SET last_checked = ? WHERE uuid = ?",
                params![Monitor::timestamp_to_i64(checked_at), monitor_uuid.to_string()],
            )
            .await?;

        // The monitor may have been deleted while its probe was in flight.
        if changed == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn create_monitor(&self, monitor: &Monitor) -> Result<Monitor, StoreError> {
        if self.url_taken(&monitor.owner_id, &monitor.url, None).await? {
            return Err(StoreError::Conflict);
        }

        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO monitors (uuid, owner_id, url, name, check_interval, is_active, \
             last_checked, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                monitor.uuid.to_string(),
                monitor.owner_id.clone(),
                monitor.url.clone(),
                monitor.name.clone(),
                monitor.check_interval,
                if monitor.is_active { 1 } else { 0 },
                monitor.last_checked.map(Monitor::timestamp_to_i64),
                Monitor::timestamp_to_i64(monitor.created_at),
                Monitor::timestamp_to_i64(monitor.updated_at)
            ],
        )
        .await
        .map_err(map_unique_violation)?;

        let mut created = monitor.clone();
        created.id = Some(conn.last_insert_rowid());
        Ok(created)
    }

    async fn get_monitor(&self, monitor_uuid: Uuid) -> Result<Option<Monitor>, StoreError> {
        let sql = format!("SELECT {MONITOR_COLUMNS} FROM monitors WHERE uuid = ?");
        Ok(self.query_monitors(&sql, params![monitor_uuid.to_string()]).await?.pop())
    }

    async fn get_monitor_for_owner(
        &self,
        monitor_uuid: Uuid,
        owner_id: &str,
    ) -> Result<Option<Monitor>, StoreError> {
        let sql = format!("SELECT {MONITOR_COLUMNS} FROM monitors WHERE uuid = ? AND owner_id = ?");
        Ok(self.query_monitors(&sql, params![monitor_uuid.to_string(), owner_id]).await?.pop())
    }

    async fn list_monitors_for_owner(&self, owner_id: &str) -> Result<Vec<Monitor>, StoreError> {
        let sql = format!("SELECT {MONITOR_COLUMNS} FROM monitors WHERE owner_id = ? ORDER BY id");
        self.query_monitors(&sql, params![owner_id]).await
    }

    async fn update_monitor(
        &self,
        monitor_uuid: Uuid,
        owner_id: &str,
        update: &MonitorUpdate,
    ) -> Result<Option<Monitor>, StoreError> {
        let Some(mut monitor) = self.get_monitor_for_owner(monitor_uuid, owner_id).await? else {
            return Ok(None);
        };

        if let Some(url) = &update.url {
            if self.url_taken(owner_id, url, Some(monitor_uuid)).await? {
                return Err(StoreError::Conflict);
            }
        }

        update.apply_to(&mut monitor);

        let conn = self.get_conn().await?;
        conn.execute(
            "UPDATE monitors SET url = ?, name = ?, check_interval = ?, is_active = ?, \
             updated_at = ? WHERE uuid = ? AND owner_id = ?",
            params![
                monitor.url.clone(),
                monitor.name.clone(),
                monitor.check_interval,
                if monitor.is_active { 1 } else { 0 },
                Monitor::timestamp_to_i64(monitor.updated_at),
                monitor_uuid.to_string(),
                owner_id
            ],
        )
        .await
        .map_err(map_unique_violation)?;

        Ok(Some(monitor))
    }

    async fn delete_monitor(&self, monitor_uuid: Uuid, owner_id: &str) -> Result<bool, StoreError> {
        let conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        let deleted = tx
            .execute(
                "DELETE FROM monitors WHERE uuid = ? AND owner_id = ?",
                params![monitor_uuid.to_string(), owner_id],
            )
            .await?;

        if deleted > 0 {
            tx.execute(
                "DELETE FROM check_logs WHERE monitor_uuid = ?",
                params![monitor_uuid.to_string()],
            )
            .await?;
        }

        tx.commit().await?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl CheckLogStore for DatabaseImpl {
    async fn append_log(&self, entry: &CheckLogEntry) -> Result<i64, StoreError> {
        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO check_logs (monitor_uuid, status, status_code, response_time_ms, \
             error_message, checked_at) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                entry.monitor_id.to_string(),
                entry.status.to_string(),
                i64::from(entry.status_code),
                i64::try_from(entry.response_time).unwrap_or(i64::MAX),
                entry.error.clone(),
                Monitor::timestamp_to_i64(entry.checked_at)
            ],
        )
        .await?;

        Ok(conn.last_insert_rowid())
    }

    async fn recent_logs(
        &self,
        monitor_uuid: Uuid,
        limit: usize,
    ) -> Result<Vec<CheckLogEntry>, StoreError> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM check_logs WHERE monitor_uuid = ? \
             ORDER BY checked_at DESC, id DESC LIMIT ?"
        );
        let mut rows = conn
            .query(&sql, params![monitor_uuid.to_string(), i64::try_from(limit).unwrap_or(i64::MAX)])
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(log_from_row(&row)?);
        }

        Ok(entries)
    }

    async fn prune_logs(&self, keep_last: usize) -> Result<u64, StoreError> {
        let conn = self.get_conn().await?;
        let deleted = conn
            .execute(
                "DELETE FROM check_logs WHERE id IN (
                    SELECT id FROM (
                        SELECT id, ROW_NUMBER() OVER (
                            PARTITION BY monitor_uuid ORDER BY checked_at DESC, id DESC
                        ) AS position
                        FROM check_logs
                    ) WHERE position > ?
                )",
                params![i64::try_from(keep_last).unwrap_or(i64::MAX)],
            )
            .await?;

        // A probe finishing after its monitor was deleted can leave one behind.
        let orphaned = conn
            .execute(
                "DELETE FROM check_logs WHERE monitor_uuid NOT IN (SELECT uuid FROM monitors)",
                (),
            )
            .await?;

        Ok(deleted + orphaned)
    }
}

fn monitor_from_row(row: &Row) -> Result<Monitor, StoreError> {
    let uuid_str: String = row.get(1)?;

    Ok(Monitor {
        id: Some(row.get(0)?),
        uuid: Uuid::parse_str(&uuid_str)?,
        owner_id: row.get(2)?,
        url: row.get(3)?,
        name: row.get(4)?,
        check_interval: row.get(5)?,
        is_active: row.get::<i64>(6)? != 0,
        last_checked: row.get::<Option<i64>>(7)?.map(Monitor::i64_to_timestamp),
        created_at: Monitor::i64_to_timestamp(row.get(8)?),
        updated_at: Monitor::i64_to_timestamp(row.get(9)?),
    })
}

fn log_from_row(row: &Row) -> Result<CheckLogEntry, StoreError> {
    let monitor_uuid_str: String = row.get(1)?;
    let status_str: String = row.get(2)?;

    Ok(CheckLogEntry {
        id: Some(row.get(0)?),
        monitor_id: Uuid::parse_str(&monitor_uuid_str)?,
        status: status_str.parse().map_err(StoreError::Corrupt)?,
        status_code: u16::try_from(row.get::<i64>(3)?)
            .map_err(|_| StoreError::Corrupt("status code out of range".into()))?,
        response_time: u64::try_from(row.get::<i64>(4)?).unwrap_or_default(),
        error: row.get(5)?,
        checked_at: Monitor::i64_to_timestamp(row.get(6)?),
    })
}

/// SQLite reports the (owner_id, url) index as a plain constraint failure.
fn map_unique_violation(error: libsql::Error) -> StoreError {
    if error.to_string().contains("UNIQUE constraint failed") {
        StoreError::Conflict
    } else {
        StoreError::QueryFailure(error)
    }
}
