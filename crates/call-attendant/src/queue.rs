//! Caller hand-off between the line and the processing engine
//!
//! The line side owns a [`CallerSender`] and pushes callers as it decodes
//! them; the engine owns the single [`CallerQueue`] and pops them in arrival
//! order. Pushing never blocks, so it is safe from plain OS threads that
//! service a serial port as well as from async tasks.

use crate::caller::Caller;
use crate::error::{AttendantError, Result};
use tokio::sync::mpsc;
use tracing::debug;

/// Create a connected sender/queue pair
pub fn caller_queue() -> (CallerSender, CallerQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CallerSender { tx }, CallerQueue { rx })
}

/// Producing end, held by the line driver
#[derive(Debug, Clone)]
pub struct CallerSender {
    tx: mpsc::UnboundedSender<Caller>,
}

impl CallerSender {
    /// Enqueue a caller without blocking.
    ///
    /// Fails only when the engine has dropped its queue.
    pub fn push(&self, caller: Caller) -> Result<()> {
        debug!(number = %caller.number(), "Adding to caller queue");
        self.tx
            .send(caller)
            .map_err(|_| AttendantError::IngestionClosed)
    }

    /// Whether the consuming side is gone
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consuming end, owned by the engine
#[derive(Debug)]
pub struct CallerQueue {
    rx: mpsc::UnboundedReceiver<Caller>,
}

impl CallerQueue {
    /// Wait for the next caller.
    ///
    /// Returns [`AttendantError::IngestionClosed`] once every sender has
    /// been dropped and the queue is drained.
    pub async fn pop(&mut self) -> Result<Caller> {
        self.rx.recv().await.ok_or(AttendantError::IngestionClosed)
    }
}
