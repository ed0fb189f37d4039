/// Integration tests for the orchestrator
///
/// These run the real scheduler against a temporary LibSQL database and a
/// local TCP listener standing in for a monitored website.
use crate::config::Config;
use crate::database::{DatabaseImpl, Monitor, MonitorStore, CheckLogStore, open_database};
use crate::monitoring::MonitorStatus;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve `200 OK` to every connection
async fn spawn_ok_server() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                    .await;
            });
        }
    });

    Ok(format!("http://{addr}/"))
}

#[tokio::test]
async fn test_start_probes_and_shutdown_stops() -> Result<()> {
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().join("orchestrator.db").to_string_lossy().to_string();
    let url = spawn_ok_server().await?;

    let mut config = Config::default();
    config.database.path = db_path.clone();
    config.scheduler.tick_seconds = 1;

    let pool = open_database(&db_path).await?;
    let db = Arc::new(DatabaseImpl::new_from_pool(pool.clone()));
    let monitor = Monitor::new("alice".into(), url, None, 5);
    db.create_monitor(&monitor).await?;

    let handle = Orchestrator::start(&config, pool).await?;

    // The first tick fires right away
    let logs = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let logs = db.recent_logs(monitor.uuid, 10).await?;
            if !logs.is_empty() {
                return Ok::<_, anyhow::Error>(logs);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await??;

    assert_eq!(logs[0].status, MonitorStatus::Up);
    assert_eq!(logs[0].status_code, 200);
    assert!(db.get_monitor(monitor.uuid).await?.unwrap().last_checked.is_some());

    tokio::time::timeout(Duration::from_secs(10), handle.shutdown()).await?;
    Ok(())
}

#[tokio::test]
async fn test_start_migrates_a_fresh_database() -> Result<()> {
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().join("fresh.db").to_string_lossy().to_string();

    // a bare pool, no migrations yet
    let pool = crate::pool::build_pool(&db_path).await?;
    let handle = Orchestrator::start(&Config::default(), pool.clone()).await?;

    let db = DatabaseImpl::new_from_pool(pool);
    assert!(db.list_active_monitors().await?.is_empty());

    handle.shutdown().await;
    Ok(())
}
