//! Shutdown coordination.

use std::future::Future;

use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinHandle};

/// Coordinator for graceful shutdown.
///
/// The HTTP server and the rule scheduler each hold a receiver; a single
/// `trigger` stops both.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let receivers = self.tx.send(()).unwrap_or(0);
        tracing::debug!(receivers, "Shutdown triggered");
    }

    /// Wait for `signal` or for `task` to end on its own, whichever is first,
    /// then trigger shutdown and return the task's result.
    pub async fn supervise<T, F>(&self, mut task: JoinHandle<T>, signal: F) -> Result<T, JoinError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            _ = signal => {
                self.trigger();
                task.await
            }
            result = &mut task => {
                tracing::warn!("Supervised task exited before shutdown was requested");
                self.trigger();
                result
            }
        }
    }

    /// Number of tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once `rx` fires or its sender is gone.
pub async fn wait(mut rx: broadcast::Receiver<()>) {
    let _ = rx.recv().await;
}
