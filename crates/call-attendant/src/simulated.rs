//! Simulated line hardware
//!
//! Lets the attendant run end-to-end without a modem. [`CallerIdFeed`]
//! reads caller-ID reports in the text form voice modems emit and turns
//! them into queued callers and ring pulses:
//!
//! ```text
//! RING
//! DATE = 0801
//! TIME = 1801
//! NMBR = 5551234567
//! NAME = JOHN DOE
//! RING
//! ```
//!
//! [`SimulatedLine`] tracks the hook state and records everything the
//! dispatcher does with the line.

use crate::caller::{CallId, Caller};
use crate::error::{AttendantError, Result};
use crate::line::{HookSwitch, LineDriver};
use crate::messaging::MessageRecorder;
use crate::queue::CallerSender;
use crate::ring::RingSignal;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::borrow::Cow;
use std::collections::HashSet;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, trace, warn};

/// Something that happened on the simulated line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    OffHook,
    OnHook,
    PickUpRefused,
    Played(String),
}

/// In-process stand-in for the line hardware
#[derive(Debug, Default)]
pub struct SimulatedLine {
    hook: HookSwitch,
    events: Mutex<Vec<LineEvent>>,
    failing_audio: Mutex<HashSet<String>>,
}

impl SimulatedLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Someone picks up an extension phone
    pub fn manual_pick_up(&self) -> bool {
        self.hook.try_off_hook()
    }

    /// The extension phone is put back
    pub fn manual_hang_up(&self) {
        self.hook.on_hook();
    }

    pub fn is_off_hook(&self) -> bool {
        self.hook.is_off_hook()
    }

    /// Make playback of `resource` fail
    pub fn fail_audio_for(&self, resource: impl Into<String>) {
        self.failing_audio.lock().insert(resource.into());
    }

    pub fn events(&self) -> Vec<LineEvent> {
        self.events.lock().clone()
    }

    fn record(&self, event: LineEvent) {
        self.events.lock().push(event);
    }
}

#[async_trait]
impl LineDriver for SimulatedLine {
    async fn pick_up(&self) -> bool {
        if self.hook.try_off_hook() {
            info!("Line off-hook");
            self.record(LineEvent::OffHook);
            true
        } else {
            self.record(LineEvent::PickUpRefused);
            false
        }
    }

    async fn hang_up(&self) {
        self.hook.on_hook();
        info!("Line on-hook");
        self.record(LineEvent::OnHook);
    }

    async fn play_audio(&self, resource: &str) -> Result<()> {
        if !self.hook.is_off_hook() {
            return Err(AttendantError::hardware("cannot play audio while on-hook"));
        }
        if self.failing_audio.lock().contains(resource) {
            return Err(AttendantError::hardware(format!("playback of {} failed", resource)));
        }
        info!(resource, "Playing audio");
        self.record(LineEvent::Played(resource.to_string()));
        Ok(())
    }
}

/// Recorder that only reports what it would have captured
#[derive(Debug, Default)]
pub struct LoggingRecorder {
    messages: Mutex<Vec<CallId>>,
    menus: Mutex<Vec<CallId>>,
}

impl LoggingRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<CallId> {
        self.messages.lock().clone()
    }

    pub fn menus(&self) -> Vec<CallId> {
        self.menus.lock().clone()
    }
}

#[async_trait]
impl MessageRecorder for LoggingRecorder {
    async fn record_message(&self, call_id: CallId, caller: &Caller) -> Result<()> {
        info!(call_id = %call_id, number = %caller.display_number(), "Recording message");
        self.messages.lock().push(call_id);
        Ok(())
    }

    async fn interactive_menu(&self, call_id: CallId, caller: &Caller) -> Result<()> {
        info!(call_id = %call_id, number = %caller.display_number(), "Starting voice mail menu");
        self.menus.lock().push(call_id);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct PendingCallerId {
    date: Option<String>,
    time: Option<String>,
    number: Option<String>,
}

impl PendingCallerId {
    fn take_caller(&mut self, name: Option<String>) -> Option<Caller> {
        let number = self.number.take()?;
        let mut caller = Caller::new(number);
        if let (Some(date), Some(time)) = (self.date.take(), self.time.take()) {
            caller = caller.with_date_time(date, time);
        }
        if let Some(name) = name {
            caller = caller.with_name(name);
        }
        *self = Self::default();
        Some(caller)
    }
}

/// Turns caller-ID text reports into queued callers and ring pulses
pub struct CallerIdFeed {
    sender: CallerSender,
    ring_signal: RingSignal,
}

impl CallerIdFeed {
    pub fn new(sender: CallerSender, ring_signal: RingSignal) -> Self {
        Self { sender, ring_signal }
    }

    /// Read reports until end of input. Returns the number of callers queued.
    ///
    /// A caller is queued when its `NAME` field arrives, or on the next
    /// `RING` (or end of input) when the line sent no name. Every caller is
    /// stamped with the ring total at queue time, so a `RING` that follows a
    /// name-less report still counts as the caller's second ring. Bytes that
    /// are not valid UTF-8 are replaced rather than ending the feed.
    pub async fn run<R>(self, mut reader: R) -> Result<u64>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut buf = Vec::new();
        let mut pending = PendingCallerId::default();
        let mut queued = 0u64;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let decoded = String::from_utf8_lossy(&buf);
            let line = decoded.trim();
            if line.is_empty() {
                continue;
            }
            if matches!(&decoded, Cow::Owned(_)) {
                warn!(line, "Caller-ID report contained invalid UTF-8");
            }
            trace!(line, "Caller-ID report");

            if line.eq_ignore_ascii_case("RING") {
                if let Some(caller) = pending.take_caller(None) {
                    self.queue(caller)?;
                    queued += 1;
                }
                self.ring_signal.raise();
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                debug!(line, "Ignoring unrecognized line report");
                continue;
            };
            let value = value.trim().to_string();
            match key.trim().to_ascii_uppercase().as_str() {
                "DATE" => pending.date = Some(value),
                "TIME" => pending.time = Some(value),
                "NMBR" => pending.number = Some(value),
                "NAME" => {
                    if let Some(caller) = pending.take_caller(Some(value)) {
                        self.queue(caller)?;
                        queued += 1;
                    }
                }
                other => debug!(field = other, "Ignoring unknown caller-ID field"),
            }
        }

        if let Some(caller) = pending.take_caller(None) {
            self.queue(caller)?;
            queued += 1;
        }
        info!(queued, "Caller-ID feed ended");
        Ok(queued)
    }

    fn queue(&self, caller: Caller) -> Result<()> {
        let caller = caller.with_ring_mark(self.ring_signal.rings_raised());
        self.sender.push(caller)
    }
}
