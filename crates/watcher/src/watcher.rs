//! Polling watch sessions
//!
//! A session enumerates its target once, delivers every tracked path as an
//! addition, then rescans on a fixed interval until cancelled. All session
//! state lives in one background task; consumers only see delivered batches.

use crate::config::WatcherConfig;
use crate::events::Batch;
use crate::scanner::Scanner;
use pollwatch_core::config::DEFAULT_INTERVAL_MS;
use pollwatch_core::error::{Error, Result};
use std::path::Path;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

/// Interval used when none is supplied
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(DEFAULT_INTERVAL_MS);

/// A batch and the acknowledgement the worker waits for before moving on
type Handoff = (Batch, oneshot::Sender<()>);

/// Start a polling watch session on `path`
///
/// Resolves and enumerates `path` before returning. Errors if resolution or
/// the initial walk fails, or if `interval` is zero; no background work is
/// started in that case. The returned stream first yields one batch marking
/// every tracked path as added, then one batch per tick that saw changes.
/// It closes once `cancel` fires.
pub async fn start(
    cancel: CancellationToken,
    path: impl AsRef<Path>,
    recursive: bool,
    interval: Option<Duration>,
) -> Result<BatchStream> {
    let interval = match interval {
        Some(interval) if interval.is_zero() => {
            return Err(Error::invalid_input(
                "watch interval must be greater than zero",
            ));
        }
        Some(interval) => interval,
        None => DEFAULT_INTERVAL,
    };

    let watcher = PollWatcher {
        interval,
        recursive,
    };
    watcher.watch(path, cancel).await
}

/// Receiving end of a watch session
///
/// Every batch is handed over one at a time: the session does not move on
/// until the previous batch has been taken by [`BatchStream::recv`].
/// Dropping the stream ends the session.
#[derive(Debug)]
pub struct BatchStream {
    rx: mpsc::Receiver<Handoff>,
    cancel: CancellationToken,
}

impl BatchStream {
    /// Wait for the next batch
    ///
    /// Returns `None` once the session's token has fired or the session has
    /// stopped. A batch still in flight when the token fires is discarded.
    pub async fn recv(&mut self) -> Option<Batch> {
        let (batch, ack) = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                self.rx.close();
                return None;
            }
            handoff = self.rx.recv() => handoff?,
        };

        // Fails only if the worker was cancelled in the meantime
        let _ = ack.send(());
        Some(batch)
    }
}

/// Polling file watcher
#[derive(Debug, Clone)]
pub struct PollWatcher {
    /// Time between scans
    interval: Duration,
    /// Descend into subdirectories of the watch root
    recursive: bool,
}

impl PollWatcher {
    /// Create a new watcher from validated configuration
    pub fn new(config: WatcherConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            interval: config.interval(),
            recursive: config.recursive,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// Start a watch session on `path`, running until `cancel` fires
    pub async fn watch(
        &self,
        path: impl AsRef<Path>,
        cancel: CancellationToken,
    ) -> Result<BatchStream> {
        let path = path.as_ref().to_path_buf();
        let recursive = self.recursive;

        let scanner = tokio::task::spawn_blocking(move || Scanner::new(path, recursive))
            .await
            .map_err(|e| Error::watcher(format!("Initial enumeration task failed: {e}")))??;

        info!(
            "Watching {} ({} paths, recursive: {}, interval: {:?})",
            scanner.root().display(),
            scanner.len(),
            recursive,
            self.interval
        );

        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(run_session(scanner, tx, cancel.clone(), self.interval));

        Ok(BatchStream { rx, cancel })
    }
}

/// Session worker: owns the tracked set until cancellation
async fn run_session(
    mut scanner: Scanner,
    tx: mpsc::Sender<Handoff>,
    cancel: CancellationToken,
    period: Duration,
) {
    let root = scanner.root().to_path_buf();

    if let Some(initial) = scanner.initial_batch() {
        if !deliver(&tx, &cancel, initial).await {
            info!("Watch session for {} stopped", root.display());
            return;
        }
    }

    // First scan one full period after the initial batch was accepted
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Watch session for {} cancelled", root.display());
                break;
            }
            _ = tx.closed() => {
                debug!("Batch stream for {} dropped by consumer", root.display());
                break;
            }
            _ = ticker.tick() => {}
        }

        let scan = tokio::task::spawn_blocking(move || {
            let events = scanner.scan();
            (scanner, events)
        });

        let (returned, events) = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Watch session for {} cancelled during scan", root.display());
                break;
            }
            joined = scan => match joined {
                Ok(result) => result,
                Err(e) => {
                    error!("Scan of {} failed: {}", root.display(), e);
                    break;
                }
            },
        };
        scanner = returned;

        let Some(batch) = Batch::new(events) else {
            trace!("No changes under {}", root.display());
            continue;
        };

        if !deliver(&tx, &cancel, batch).await {
            break;
        }
    }

    // Dropping `tx` here closes the stream
    info!("Watch session for {} stopped", root.display());
}

/// Hand a batch to the consumer and wait until it is taken
///
/// Returns false when the session should end instead.
async fn deliver(tx: &mpsc::Sender<Handoff>, cancel: &CancellationToken, batch: Batch) -> bool {
    let count = batch.len();
    let (ack_tx, ack_rx) = oneshot::channel();

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("Dropping batch of {count} events: session cancelled");
            return false;
        }
        sent = tx.send((batch, ack_tx)) => {
            if sent.is_err() {
                debug!("Batch stream dropped by consumer");
                return false;
            }
        }
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("Batch of {count} events not taken before cancellation");
            false
        }
        acked = ack_rx => match acked {
            Ok(()) => {
                debug!("Delivered batch of {count} events");
                true
            }
            Err(_) => {
                debug!("Batch stream dropped by consumer");
                false
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ChangeEvent, FileMetadata};
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn one_event_batch() -> Batch {
        Batch::new(vec![ChangeEvent::added(
            "/w/a".into(),
            FileMetadata::new(1, SystemTime::UNIX_EPOCH),
        )])
        .expect("non-empty batch")
    }

    #[tokio::test]
    async fn test_zero_interval_is_rejected() {
        let temp_dir = TempDir::new().expect("test setup failed");
        let result = start(
            CancellationToken::new(),
            temp_dir.path(),
            false,
            Some(Duration::ZERO),
        )
        .await;

        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = WatcherConfig {
            interval_ms: 0,
            ..Default::default()
        };
        assert!(PollWatcher::new(config).is_err());
    }

    #[test]
    fn test_watcher_from_config() {
        let config = WatcherConfig {
            interval_ms: 250,
            recursive: true,
        };
        let watcher = PollWatcher::new(config).expect("valid config");

        assert_eq!(watcher.interval(), Duration::from_millis(250));
        assert!(watcher.is_recursive());
    }

    #[test]
    fn test_default_interval() {
        assert_eq!(DEFAULT_INTERVAL, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_missing_path_fails_before_spawning() {
        let temp_dir = TempDir::new().expect("test setup failed");
        let result = start(
            CancellationToken::new(),
            temp_dir.path().join("absent"),
            true,
            None,
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_pre_cancelled_session_closes_stream() {
        let temp_dir = TempDir::new().expect("test setup failed");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut stream = start(
            cancel,
            temp_dir.path(),
            false,
            Some(Duration::from_millis(10)),
        )
        .await
        .expect("setup should succeed");

        assert!(stream.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_delivery_waits_until_batch_is_taken() {
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(1);
        let mut stream = BatchStream {
            rx,
            cancel: cancel.clone(),
        };

        let pending = tokio::spawn(async move { deliver(&tx, &cancel, one_event_batch()).await });
        time::sleep(Duration::from_millis(50)).await;
        assert!(!pending.is_finished(), "delivery returned before the batch was taken");

        let batch = stream.recv().await.expect("batch should arrive");
        assert_eq!(batch.len(), 1);

        let delivered = time::timeout(Duration::from_secs(2), pending)
            .await
            .expect("delivery should finish once taken")
            .expect("delivery task panicked");
        assert!(delivered);
    }

    #[tokio::test]
    async fn test_in_flight_batch_is_discarded_on_cancel() {
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(1);
        let mut stream = BatchStream {
            rx,
            cancel: cancel.clone(),
        };

        let worker_cancel = cancel.clone();
        let pending =
            tokio::spawn(async move { deliver(&tx, &worker_cancel, one_event_batch()).await });
        time::sleep(Duration::from_millis(50)).await;

        cancel.cancel();
        assert!(stream.recv().await.is_none());

        let delivered = pending.await.expect("delivery task panicked");
        assert!(!delivered);
    }

    #[tokio::test]
    async fn test_session_ends_when_stream_is_dropped() {
        let temp_dir = TempDir::new().expect("test setup failed");
        let scanner = Scanner::new(temp_dir.path(), false).expect("test setup failed");
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(1);

        let session = tokio::spawn(run_session(
            scanner,
            tx,
            cancel.clone(),
            Duration::from_millis(10),
        ));
        let mut stream = BatchStream {
            rx,
            cancel: cancel.clone(),
        };
        assert!(stream.recv().await.is_some());

        // Nothing changes under the root, so only the dropped stream can stop it
        drop(stream);
        let stopped = time::timeout(Duration::from_secs(2), session).await;
        assert!(stopped.is_ok(), "session kept polling after its stream was dropped");
        assert!(!cancel.is_cancelled());
    }
}
