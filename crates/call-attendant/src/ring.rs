//! Ring cadence tracking
//!
//! The line raises a [`RingSignal`] on every ring pulse. Before answering,
//! the engine asks the [`RingTimer`] to count pulses since the ring that
//! carried the caller-ID until the configured number of rings is reached. A pulse that fails to arrive within the
//! per-ring timeout means ringing stopped: the caller hung up or someone
//! answered on another extension, and picking up now would be wrong.
//!
//! ```text
//!  ring 1 (triggers caller-ID)   ring 2          ring 3
//!  ▁▁██▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁██▁▁▁▁▁▁▁▁▁▁▁▁▁▁██▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁
//!        |<--- per-ring timeout --->|
//!                                      |<--- per-ring timeout --->| stop
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info};

/// Default per-ring timeout.
///
/// North American cadence is two seconds of ringing followed by four of
/// silence; seven seconds covers one full cycle plus jitter.
pub const DEFAULT_PER_RING_TIMEOUT: Duration = Duration::from_secs(7);

/// Monotonic ring counter shared by the line and the engine
#[derive(Debug, Clone, Default)]
pub struct RingSignal {
    notify: Arc<Notify>,
    raised: Arc<AtomicU64>,
}

impl RingSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a ring pulse and wake any waiter
    pub fn raise(&self) {
        self.raised.fetch_add(1, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Total pulses raised since creation
    pub fn rings_raised(&self) -> u64 {
        self.raised.load(Ordering::SeqCst)
    }

    /// Wait until the total passes `seen`. Returns the new total, or `None`
    /// if no ring arrives within `timeout`.
    pub async fn wait_past(&self, seen: u64, timeout: Duration) -> Option<u64> {
        let next_ring = async {
            loop {
                let notified = self.notify.notified();
                tokio::pin!(notified);
                // Register before reading the counter so a raise in between
                // still wakes us.
                notified.as_mut().enable();
                let raised = self.rings_raised();
                if raised > seen {
                    return raised;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, next_ring).await.ok()
    }
}

/// Outcome of waiting for the ring count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingWaitResult {
    /// Whether the call may be answered
    pub eligible: bool,
    /// Rings observed, including the one that triggered the call
    pub ring_count: u32,
}

/// Counts rings until a call becomes eligible for answering
#[derive(Debug, Clone)]
pub struct RingTimer {
    per_ring_timeout: Duration,
}

impl Default for RingTimer {
    fn default() -> Self {
        Self::new(DEFAULT_PER_RING_TIMEOUT)
    }
}

impl RingTimer {
    pub fn new(per_ring_timeout: Duration) -> Self {
        Self { per_ring_timeout }
    }

    pub fn per_ring_timeout(&self) -> Duration {
        self.per_ring_timeout
    }

    /// Wait until `required_rings` have been observed or ringing stops,
    /// treating the most recent ring as the first.
    ///
    /// `required_rings <= 1` is eligible immediately.
    pub async fn await_eligibility(&self, required_rings: u32, signal: &RingSignal) -> RingWaitResult {
        self.await_eligibility_since(required_rings, signal, signal.rings_raised())
            .await
    }

    /// Like [`await_eligibility`](Self::await_eligibility), but the first
    /// ring is the one at which the signal total was `mark`. Rings raised
    /// after the mark are counted even if they came before this call.
    pub async fn await_eligibility_since(
        &self,
        required_rings: u32,
        signal: &RingSignal,
        mark: u64,
    ) -> RingWaitResult {
        let mut ring_count: u32 = 1;
        let mut seen = mark;

        while ring_count < required_rings {
            match signal.wait_past(seen, self.per_ring_timeout).await {
                Some(raised) => {
                    let new_rings = u32::try_from(raised - seen).unwrap_or(u32::MAX);
                    ring_count = ring_count.saturating_add(new_rings);
                    seen = raised;
                    debug!(ring_count, required_rings, "Ring observed");
                }
                None => {
                    info!(
                        ring_count,
                        required_rings, "Ringing stopped: caller hung up or callee answered"
                    );
                    return RingWaitResult {
                        eligible: false,
                        ring_count,
                    };
                }
            }
        }

        RingWaitResult {
            eligible: true,
            ring_count,
        }
    }
}
