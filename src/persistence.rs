// src/persistence.rs - Background persistence writer
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::{debug, error, info, trace, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};

use crate::{Config, KeyValueStore, NotesError, Result};

/// Upper bound on how long shutdown waits for queued writes to drain.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// A single storage mutation queued by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Set { key: String, value: String },
    Remove { key: String },
}

impl StoreOp {
    pub fn key(&self) -> &str {
        match self {
            StoreOp::Set { key, .. } | StoreOp::Remove { key } => key,
        }
    }
}

#[derive(Debug)]
pub enum WriterCommand {
    /// Apply a storage mutation
    Apply(StoreOp),
    /// Acknowledge once everything queued before it has been applied
    Flush(oneshot::Sender<()>),
    /// Stop the writer task
    Stop,
}

/// How failed storage operations are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each following one
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.write_retries,
            initial_backoff: config.retry_backoff(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Debug, Clone, Default)]
pub struct WriterStatus {
    /// Whether the writer task is running
    pub is_running: bool,
    /// Storage operations applied successfully
    pub writes_completed: u64,
    /// Storage operations dropped after exhausting retries
    pub writes_failed: u64,
    /// The most recent failure, if any
    pub last_error: Option<String>,
    /// When the last successful write finished
    pub last_write_time: Option<DateTime<Utc>>,
}

/// Serializes storage writes on a single background task.
///
/// Enqueuing never blocks; commands are applied strictly in the order they
/// were sent, so the last write to a key wins.
pub struct PersistenceWriter {
    /// Channel to send commands to the writer task
    command_tx: mpsc::UnboundedSender<WriterCommand>,

    /// Handle to the writer task
    writer_task: Option<JoinHandle<()>>,

    /// Shared with the writer task
    status: Arc<Mutex<WriterStatus>>,
}

impl PersistenceWriter {
    /// Spawns the writer task. Must be called from within a Tokio runtime.
    pub fn spawn(store: Arc<dyn KeyValueStore>, policy: RetryPolicy) -> Self {
        info!(
            "Starting persistence writer (retries={}, backoff={:?})",
            policy.max_retries, policy.initial_backoff
        );

        let (command_tx, mut command_rx) = mpsc::unbounded_channel();
        let status = Arc::new(Mutex::new(WriterStatus {
            is_running: true,
            ..Default::default()
        }));
        let task_status = Arc::clone(&status);

        let task = tokio::spawn(async move {
            while let Some(command) = command_rx.recv().await {
                match command {
                    WriterCommand::Apply(op) => {
                        let outcome = apply_with_retry(store.as_ref(), &op, &policy).await;
                        record_outcome(&task_status, &op, outcome);
                    }
                    WriterCommand::Flush(ack) => {
                        trace!("Flush acknowledged");
                        let _ = ack.send(());
                    }
                    WriterCommand::Stop => {
                        debug!("Persistence writer received stop");
                        break;
                    }
                }
            }

            if let Ok(mut status) = task_status.lock() {
                status.is_running = false;
            }
            info!("Persistence writer stopped");
        });

        Self {
            command_tx,
            writer_task: Some(task),
            status,
        }
    }

    /// Queues a write of `value` under `key` without waiting for it.
    pub fn set(&self, key: &str, value: String) {
        self.enqueue(StoreOp::Set {
            key: key.to_string(),
            value,
        });
    }

    /// Queues removal of `key` without waiting for it.
    pub fn remove(&self, key: &str) {
        self.enqueue(StoreOp::Remove {
            key: key.to_string(),
        });
    }

    fn enqueue(&self, op: StoreOp) {
        let key = op.key().to_string();
        if self.command_tx.send(WriterCommand::Apply(op)).is_err() {
            warn!("Persistence writer is stopped, dropping write for {}", key);
        } else {
            trace!("Queued write for {}", key);
        }
    }

    /// Waits until every command queued before this call has been applied.
    pub async fn flush(&self) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.command_tx
            .send(WriterCommand::Flush(ack_tx))
            .map_err(|_| NotesError::WriterStopped)?;

        ack_rx.await.map_err(|_| NotesError::WriterStopped)
    }

    /// Drains the queue and stops the writer task.
    pub async fn shutdown(&mut self) -> Result<()> {
        let Some(task) = self.writer_task.take() else {
            debug!("Persistence writer already shut down");
            return Ok(());
        };

        info!("Shutting down persistence writer...");
        // Stop is queued behind pending writes, so they are applied first
        let _ = self.command_tx.send(WriterCommand::Stop);

        match time::timeout(SHUTDOWN_TIMEOUT, task).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(NotesError::ApplicationError {
                message: format!("Persistence writer task failed: {}", e),
            }),
            Err(_) => {
                warn!("Timed out while draining persistence writer");
                Err(NotesError::ApplicationError {
                    message: "Timed out while draining persistence writer".to_string(),
                })
            }
        }
    }

    pub fn status(&self) -> WriterStatus {
        match self.status.lock() {
            Ok(status) => status.clone(),
            Err(e) => {
                error!("Failed to acquire lock on writer status: {}", e);
                WriterStatus::default()
            }
        }
    }
}

async fn apply(store: &dyn KeyValueStore, op: &StoreOp) -> Result<()> {
    match op {
        StoreOp::Set { key, value } => store.set(key, value).await,
        StoreOp::Remove { key } => store.remove(key).await,
    }
}

async fn apply_with_retry(
    store: &dyn KeyValueStore,
    op: &StoreOp,
    policy: &RetryPolicy,
) -> Result<()> {
    let mut attempt = 0;
    let mut backoff = policy.initial_backoff;

    loop {
        match apply(store, op).await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < policy.max_retries => {
                attempt += 1;
                warn!(
                    "Storage write for {} failed ({}), retry {}/{} in {:?}",
                    op.key(),
                    e,
                    attempt,
                    policy.max_retries,
                    backoff
                );
                time::sleep(backoff).await;
                backoff = backoff.saturating_mul(2);
            }
            Err(e) => return Err(e),
        }
    }
}

fn record_outcome(status: &Mutex<WriterStatus>, op: &StoreOp, outcome: Result<()>) {
    let Ok(mut status) = status.lock() else {
        error!("Failed to acquire lock on writer status");
        return;
    };

    match outcome {
        Ok(()) => {
            debug!("Persisted {}", op.key());
            status.writes_completed += 1;
            status.last_write_time = Some(Utc::now());
        }
        Err(e) => {
            error!("Giving up on storage write for {}: {}", op.key(), e);
            status.writes_failed += 1;
            status.last_error = Some(e.to_string());
        }
    }
}
