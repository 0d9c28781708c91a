//! Unix socket IPC between the CLI and the daemon.
//!
//! One newline-terminated JSON command per connection, answered by one
//! newline-terminated JSON response.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};

use super::state::DaemonStats;
use crate::sync::SyncReport;

/// Channel used to ask the sync loop for an immediate sync.
pub type SyncTrigger = mpsc::Sender<oneshot::Sender<SyncReport>>;

/// Commands the CLI can send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum DaemonCommand {
    Status,
    /// Shut down gracefully.
    Stop,
    Stats,
    /// Run a sync now and wait for its report.
    Sync,
    Ping,
}

/// Daemon replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DaemonResponse {
    Status {
        running: bool,
        pid: u32,
        uptime_seconds: u64,
    },
    Stopping,
    Stats(DaemonStats),
    Synced(SyncReport),
    Pong,
    Error { message: String },
}

/// Shared handles a connection handler needs.
#[derive(Clone)]
struct Handles {
    stats: Arc<RwLock<DaemonStats>>,
    stop_tx: Arc<std::sync::Mutex<Option<oneshot::Sender<()>>>>,
    sync_trigger: SyncTrigger,
}

/// Serves IPC requests on `socket_path` until `shutdown_rx` fires.
pub async fn run_server(
    socket_path: &Path,
    stats: Arc<RwLock<DaemonStats>>,
    stop_tx: Option<oneshot::Sender<()>>,
    sync_trigger: SyncTrigger,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    if socket_path.exists() {
        std::fs::remove_file(socket_path).context("Failed to remove existing socket file")?;
    }

    let listener = UnixListener::bind(socket_path).context("Failed to bind Unix socket")?;
    tracing::info!("IPC server listening on {:?}", socket_path);

    let handles = Handles {
        stats,
        stop_tx: Arc::new(std::sync::Mutex::new(stop_tx)),
        sync_trigger,
    };

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, _addr)) => {
                    let handles = handles.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, handles).await {
                            tracing::warn!("Error handling IPC connection: {}", e);
                        }
                    });
                }
                Err(e) => tracing::warn!("Failed to accept connection: {}", e),
            },
            _ = shutdown_rx.recv() => {
                tracing::info!("IPC server shutting down");
                break;
            }
        }
    }

    Ok(())
}

async fn handle_connection(stream: UnixStream, handles: Handles) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut line = String::new();
    BufReader::new(reader)
        .read_line(&mut line)
        .await
        .context("Failed to read from socket")?;

    let response = match serde_json::from_str::<DaemonCommand>(line.trim()) {
        Ok(command) => {
            tracing::debug!("Received IPC command: {:?}", command);
            respond(command, &handles).await
        }
        Err(e) => DaemonResponse::Error {
            message: format!("Invalid command: {e}"),
        },
    };

    let mut payload = serde_json::to_string(&response).context("Failed to serialize response")?;
    payload.push('\n');
    writer
        .write_all(payload.as_bytes())
        .await
        .context("Failed to write response")?;
    writer.flush().await.context("Failed to flush writer")?;

    Ok(())
}

async fn respond(command: DaemonCommand, handles: &Handles) -> DaemonResponse {
    match command {
        DaemonCommand::Status => {
            let started_at = handles.stats.read().await.started_at;
            let uptime = chrono::Utc::now()
                .signed_duration_since(started_at)
                .num_seconds()
                .max(0) as u64;
            DaemonResponse::Status {
                running: true,
                pid: std::process::id(),
                uptime_seconds: uptime,
            }
        }
        DaemonCommand::Stop => {
            let sender = match handles.stop_tx.lock() {
                Ok(mut guard) => guard.take(),
                Err(poisoned) => poisoned.into_inner().take(),
            };
            if let Some(tx) = sender {
                let _ = tx.send(());
            }
            DaemonResponse::Stopping
        }
        DaemonCommand::Stats => DaemonResponse::Stats(handles.stats.read().await.clone()),
        DaemonCommand::Sync => {
            let (reply_tx, reply_rx) = oneshot::channel();
            if handles.sync_trigger.send(reply_tx).await.is_err() {
                return DaemonResponse::Error {
                    message: "Sync loop is not running".to_string(),
                };
            }
            match reply_rx.await {
                Ok(report) => DaemonResponse::Synced(report),
                Err(_) => DaemonResponse::Error {
                    message: "Sync was cancelled".to_string(),
                },
            }
        }
        DaemonCommand::Ping => DaemonResponse::Pong,
    }
}

/// Sends `command` to the daemon at `socket_path` and reads the reply.
pub async fn send_command(socket_path: &Path, command: DaemonCommand) -> Result<DaemonResponse> {
    let stream = UnixStream::connect(socket_path)
        .await
        .context("Failed to connect to daemon socket")?;
    let (reader, mut writer) = stream.into_split();

    let mut payload = serde_json::to_string(&command).context("Failed to serialize command")?;
    payload.push('\n');
    writer
        .write_all(payload.as_bytes())
        .await
        .context("Failed to write command")?;
    writer.flush().await.context("Failed to flush")?;

    let mut line = String::new();
    BufReader::new(reader)
        .read_line(&mut line)
        .await
        .context("Failed to read response")?;

    serde_json::from_str(line.trim()).context("Failed to parse response")
}

/// Blocking wrapper around [`send_command`] for CLI code.
pub fn send_command_sync(socket_path: &Path, command: DaemonCommand) -> Result<DaemonResponse> {
    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    rt.block_on(send_command(socket_path, command))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::SyncOutcome;
    use tempfile::tempdir;

    #[test]
    fn test_daemon_command_wire_format() {
        let json = serde_json::to_string(&DaemonCommand::Sync).unwrap();
        assert_eq!(json, r#"{"command":"sync"}"#);

        let parsed: DaemonCommand = serde_json::from_str(r#"{"command":"stats"}"#).unwrap();
        assert_eq!(parsed, DaemonCommand::Stats);
    }

    #[test]
    fn test_daemon_response_status_serialization() {
        let response = DaemonResponse::Status {
            running: true,
            pid: 12345,
            uptime_seconds: 3600,
        };

        let json = serde_json::to_string(&response).expect("Failed to serialize");
        assert!(json.contains("\"type\":\"status\""));
        assert!(json.contains("\"pid\":12345"));
    }

    #[test]
    fn test_daemon_response_stats_serialization() {
        let response = DaemonResponse::Stats(DaemonStats::default());
        let json = serde_json::to_string(&response).expect("Failed to serialize");
        assert!(json.contains("\"type\":\"stats\""));
        assert!(json.contains("\"syncs_completed\""));
    }

    #[tokio::test]
    async fn test_server_client_communication() {
        let dir = tempdir().expect("Failed to create temp dir");
        let socket_path = dir.path().join("test.sock");

        let stats = Arc::new(RwLock::new(DaemonStats::default()));
        let (stop_tx, stop_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (sync_tx, mut sync_rx) = mpsc::channel::<oneshot::Sender<SyncReport>>(4);

        // Stand-in for the sync loop.
        tokio::spawn(async move {
            while let Some(reply) = sync_rx.recv().await {
                let _ = reply.send(SyncReport {
                    outcome: SyncOutcome::Merged {
                        fetched: 2,
                        added: 1,
                    },
                    finished_at: chrono::Utc::now(),
                });
            }
        });

        let server_path = socket_path.clone();
        let server = tokio::spawn(async move {
            run_server(&server_path, stats, Some(stop_tx), sync_tx, shutdown_rx).await
        });
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let response = send_command(&socket_path, DaemonCommand::Ping)
            .await
            .expect("Failed to send command");
        assert!(matches!(response, DaemonResponse::Pong));

        let response = send_command(&socket_path, DaemonCommand::Status)
            .await
            .expect("Failed to send command");
        assert!(matches!(response, DaemonResponse::Status { running: true, .. }));

        let response = send_command(&socket_path, DaemonCommand::Sync)
            .await
            .expect("Failed to send command");
        match response {
            DaemonResponse::Synced(report) => assert_eq!(
                report.outcome,
                SyncOutcome::Merged {
                    fetched: 2,
                    added: 1
                }
            ),
            other => panic!("Expected Synced response, got {other:?}"),
        }

        let response = send_command(&socket_path, DaemonCommand::Stop)
            .await
            .expect("Failed to send command");
        assert!(matches!(response, DaemonResponse::Stopping));
        stop_rx.await.expect("Stop should signal the daemon");

        let _ = shutdown_tx.send(());
        let _ = tokio::time::timeout(tokio::time::Duration::from_secs(1), server).await;
    }
}
