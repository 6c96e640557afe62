//! Visual indicators
//!
//! Indicators are fire-and-forget: signalling one never fails and never
//! blocks call processing. Handles are passed to the engine when it is
//! built.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

pub trait Indicator: Send + Sync {
    fn signal(&self);
}

/// Indicator that emits a tracing event, for installs without LEDs
#[derive(Debug, Clone)]
pub struct LogIndicator {
    name: String,
}

impl LogIndicator {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Indicator for LogIndicator {
    fn signal(&self) {
        info!(indicator = %self.name, "Indicator blink");
    }
}

/// Indicator that counts how often it was signalled
#[derive(Debug, Default)]
pub struct CountingIndicator {
    count: AtomicU64,
}

impl CountingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl Indicator for CountingIndicator {
    fn signal(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }
}
