//! Shutdown fan-out for background tasks.

use tokio::sync::broadcast;

/// Broadcasts a single shutdown notice to every subscribed task.
///
/// Subscribe before spawning: a receiver created after `trigger` misses it.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Notify all subscribers. Returns how many were listening.
    pub fn trigger(&self) -> usize {
        let listening = self.tx.send(()).unwrap_or(0);
        tracing::info!(tasks = listening, "Shutdown triggered");
        listening
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
