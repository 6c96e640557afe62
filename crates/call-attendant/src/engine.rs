//! # Call Processing Engine
//!
//! The engine owns the consuming end of the caller queue and handles one
//! call at a time, in arrival order, on a single task:
//!
//! ```text
//! ┌──────────────┐ push  ┌─────────────┐ pop  ┌──────────────────────────┐
//! │  Line driver │──────▶│ CallerQueue │─────▶│  CallProcessingEngine    │
//! │ (caller-ID,  │       └─────────────┘      │                          │
//! │  ring pulses)│── raise ──┐                │  1. classify (screening) │
//! └──────────────┘           │                │  2. blink indicator      │
//!                     ┌──────▼─────┐          │  3. log call → CallId    │
//!                     │ RingSignal │◀─ wait ──│  4. await ring count     │
//!                     └────────────┘          │  5. dispatch answer plan │
//!                                             └──────────────────────────┘
//! ```
//!
//! ## Failure containment
//!
//! Everything that goes wrong while handling one call stays with that call:
//!
//! - a screening lookup failure is logged and the call is treated as
//!   Screened (fail open, so an internal error never silently blocks a
//!   caller)
//! - a call log failure is reported and the answer attempt is skipped,
//!   since recordings could not be filed against the call
//! - answer action failures are handled inside the [`AnswerDispatcher`]
//! - a panic anywhere in call handling is caught at the call boundary
//!
//! Only a closed ingestion path ends [`CallProcessingEngine::run`], because
//! no further calls can arrive.
//!
//! ## Example
//!
//! ```rust,no_run
//! use call_attendant::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(line: Arc<dyn LineDriver>, recorder: Arc<dyn MessageRecorder>) -> call_attendant::Result<()> {
//! let config = AttendantConfig::default();
//! let (sender, queue) = caller_queue();
//! let ring_signal = RingSignal::new();
//!
//! let engine = CallProcessingEngine::builder(config)
//!     .with_queue(queue)
//!     .with_ring_signal(ring_signal.clone())
//!     .with_membership_checker(Arc::new(ListScreener::new()))
//!     .with_call_logger(Arc::new(MemoryCallLog::new()))
//!     .with_line(line)
//!     .with_recorder(recorder)
//!     .build()?;
//!
//! // The line side keeps `sender` and `ring_signal`
//! sender.push(Caller::new("5551234567"))?;
//! drop(sender);
//!
//! engine.run().await
//! # }
//! ```

use crate::answer::{AnswerDispatcher, DispatchOutcome};
use crate::caller::{CallCategory, CallId, CallRecord, Caller, Classification};
use crate::config::AttendantConfig;
use crate::error::{AttendantError, Result};
use crate::indicator::{Indicator, LogIndicator};
use crate::line::LineDriver;
use crate::logger::CallLogger;
use crate::messaging::MessageRecorder;
use crate::queue::CallerQueue;
use crate::ring::{RingSignal, RingTimer, RingWaitResult};
use crate::screening::{MembershipChecker, ScreeningCoordinator};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Running counters for the engine
#[derive(Debug, Default)]
pub struct EngineStats {
    calls: AtomicU64,
    permitted: AtomicU64,
    blocked: AtomicU64,
    screened: AtomicU64,
    answered: AtomicU64,
    not_eligible: AtomicU64,
    line_busy: AtomicU64,
    action_failures: AtomicU64,
    screening_failures: AtomicU64,
    log_failures: AtomicU64,
    panics: AtomicU64,
}

/// Point-in-time copy of [`EngineStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub calls: u64,
    pub permitted: u64,
    pub blocked: u64,
    pub screened: u64,
    pub answered: u64,
    pub not_eligible: u64,
    pub line_busy: u64,
    pub action_failures: u64,
    pub screening_failures: u64,
    pub log_failures: u64,
    pub panics: u64,
}

impl EngineStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_category(&self, category: CallCategory) {
        match category {
            CallCategory::Permitted => Self::bump(&self.permitted),
            CallCategory::Blocked => Self::bump(&self.blocked),
            CallCategory::Screened => Self::bump(&self.screened),
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            calls: load(&self.calls),
            permitted: load(&self.permitted),
            blocked: load(&self.blocked),
            screened: load(&self.screened),
            answered: load(&self.answered),
            not_eligible: load(&self.not_eligible),
            line_busy: load(&self.line_busy),
            action_failures: load(&self.action_failures),
            screening_failures: load(&self.screening_failures),
            log_failures: load(&self.log_failures),
            panics: load(&self.panics),
        }
    }
}

/// Everything that happened to one call
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub caller: Caller,
    pub classification: Classification,
    /// `None` when the call logger failed
    pub call_id: Option<CallId>,
    /// `None` when the call never reached the ring wait
    pub ring_wait: Option<RingWaitResult>,
    /// `None` when no answer was attempted
    pub dispatch: Option<DispatchOutcome>,
}

impl CallOutcome {
    fn new(caller: Caller, classification: Classification) -> Self {
        Self {
            caller,
            classification,
            call_id: None,
            ring_wait: None,
            dispatch: None,
        }
    }

    /// Whether the line was taken and the plan executed, fully or partly
    pub fn answered(&self) -> bool {
        matches!(
            self.dispatch,
            Some(DispatchOutcome::Completed { .. }) | Some(DispatchOutcome::ActionFailed { .. })
        )
    }
}

/// Screens and answers calls popped from the caller queue
pub struct CallProcessingEngine {
    queue: CallerQueue,
    screener: ScreeningCoordinator,
    logger: Arc<dyn CallLogger>,
    dispatcher: AnswerDispatcher,
    ring_timer: RingTimer,
    ring_signal: RingSignal,
    approved_indicator: Arc<dyn Indicator>,
    blocked_indicator: Arc<dyn Indicator>,
    config: Arc<AttendantConfig>,
    stats: Arc<EngineStats>,
    outcomes: Option<mpsc::UnboundedSender<CallOutcome>>,
}

impl CallProcessingEngine {
    pub fn builder(config: AttendantConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    pub fn config(&self) -> &AttendantConfig {
        &self.config
    }

    pub fn stats(&self) -> Arc<EngineStats> {
        self.stats.clone()
    }

    /// Process calls until ingestion closes.
    ///
    /// Always returns an error: [`AttendantError::IngestionClosed`] when
    /// every caller producer is gone.
    pub async fn run(mut self) -> Result<()> {
        info!(
            modes = ?self.screener.modes().collect::<Vec<_>>(),
            per_ring_timeout_ms = self.ring_timer.per_ring_timeout().as_millis() as u64,
            "Call processing engine started"
        );

        loop {
            let caller = match self.queue.pop().await {
                Ok(caller) => caller,
                Err(e) => {
                    warn!(error = %e, stats = ?self.stats.snapshot(), "Call processing engine stopping");
                    return Err(e);
                }
            };

            let number = caller.display_number();
            let span = info_span!("call", number = %number);
            match AssertUnwindSafe(self.process_call(caller).instrument(span))
                .catch_unwind()
                .await
            {
                Ok(outcome) => {
                    if let Some(outcomes) = &self.outcomes {
                        let _ = outcomes.send(outcome);
                    }
                }
                Err(_) => {
                    EngineStats::bump(&self.stats.panics);
                    error!(number = %number, "Call handling panicked; continuing with next call");
                }
            }
        }
    }

    /// Screen, log and possibly answer a single call
    pub async fn process_call(&self, caller: Caller) -> CallOutcome {
        EngineStats::bump(&self.stats.calls);
        info!(number = %caller.display_number(), name = ?caller.name(), "Incoming call");

        let classification = self.classify(&caller).await;
        self.stats.record_category(classification.category);
        match classification.category {
            CallCategory::Blocked => self.blocked_indicator.signal(),
            CallCategory::Permitted | CallCategory::Screened => self.approved_indicator.signal(),
        }

        let mut outcome = CallOutcome::new(caller, classification);

        let call_id = match self
            .logger
            .log_caller(&outcome.caller, &outcome.classification)
            .await
        {
            Ok(call_id) => call_id,
            Err(e) => {
                EngineStats::bump(&self.stats.log_failures);
                error!(
                    number = %outcome.caller.display_number(),
                    category = %outcome.classification.category,
                    error = %e,
                    "Failed to log call; not answering"
                );
                return outcome;
            }
        };
        outcome.call_id = Some(call_id);
        info!(
            "--> {} {}: {}",
            outcome.caller.display_number(),
            outcome.classification.category,
            outcome.classification.reason
        );

        let record = CallRecord {
            call_id,
            classification: outcome.classification.clone(),
        };
        let plan = self.config.plan_for(record.classification.category);

        let required_rings = plan.rings_before_answer();
        let ring_wait = match outcome.caller.ring_mark() {
            Some(mark) => {
                self.ring_timer
                    .await_eligibility_since(required_rings, &self.ring_signal, mark)
                    .await
            }
            None => {
                self.ring_timer
                    .await_eligibility(required_rings, &self.ring_signal)
                    .await
            }
        };
        outcome.ring_wait = Some(ring_wait);

        if !ring_wait.eligible {
            EngineStats::bump(&self.stats.not_eligible);
            return outcome;
        }
        if plan.is_empty() {
            debug!(category = %record.classification.category, "No answer actions configured");
            return outcome;
        }

        let dispatch = self.dispatcher.run(&plan, &record, &outcome.caller).await;
        match &dispatch {
            DispatchOutcome::LineBusy => EngineStats::bump(&self.stats.line_busy),
            DispatchOutcome::Completed { .. } => EngineStats::bump(&self.stats.answered),
            DispatchOutcome::ActionFailed { .. } => {
                EngineStats::bump(&self.stats.answered);
                EngineStats::bump(&self.stats.action_failures);
            }
        }
        outcome.dispatch = Some(dispatch);
        outcome
    }

    async fn classify(&self, caller: &Caller) -> Classification {
        match self.screener.classify(caller).await {
            Ok(classification) => classification,
            Err(e) => {
                EngineStats::bump(&self.stats.screening_failures);
                error!(
                    number = %caller.display_number(),
                    error = %e,
                    "Screening failed; treating caller as screened"
                );
                Classification {
                    category: CallCategory::Screened,
                    reason: "Screening error".to_string(),
                }
            }
        }
    }
}

/// Assembles a [`CallProcessingEngine`] from its collaborators
pub struct EngineBuilder {
    config: AttendantConfig,
    queue: Option<CallerQueue>,
    ring_signal: Option<RingSignal>,
    checker: Option<Arc<dyn MembershipChecker>>,
    logger: Option<Arc<dyn CallLogger>>,
    line: Option<Arc<dyn LineDriver>>,
    recorder: Option<Arc<dyn MessageRecorder>>,
    approved_indicator: Option<Arc<dyn Indicator>>,
    blocked_indicator: Option<Arc<dyn Indicator>>,
    outcomes: Option<mpsc::UnboundedSender<CallOutcome>>,
}

impl EngineBuilder {
    pub fn new(config: AttendantConfig) -> Self {
        Self {
            config,
            queue: None,
            ring_signal: None,
            checker: None,
            logger: None,
            line: None,
            recorder: None,
            approved_indicator: None,
            blocked_indicator: None,
            outcomes: None,
        }
    }

    pub fn with_queue(mut self, queue: CallerQueue) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn with_ring_signal(mut self, signal: RingSignal) -> Self {
        self.ring_signal = Some(signal);
        self
    }

    pub fn with_membership_checker(mut self, checker: Arc<dyn MembershipChecker>) -> Self {
        self.checker = Some(checker);
        self
    }

    pub fn with_call_logger(mut self, logger: Arc<dyn CallLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_line(mut self, line: Arc<dyn LineDriver>) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn MessageRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Indicator signalled for permitted and screened callers
    pub fn with_approved_indicator(mut self, indicator: Arc<dyn Indicator>) -> Self {
        self.approved_indicator = Some(indicator);
        self
    }

    /// Indicator signalled for blocked callers
    pub fn with_blocked_indicator(mut self, indicator: Arc<dyn Indicator>) -> Self {
        self.blocked_indicator = Some(indicator);
        self
    }

    /// Receive a [`CallOutcome`] for every call the running engine finishes
    pub fn with_outcome_sink(mut self, sink: mpsc::UnboundedSender<CallOutcome>) -> Self {
        self.outcomes = Some(sink);
        self
    }

    pub fn build(self) -> Result<CallProcessingEngine> {
        self.config.validate()?;

        let queue = self.queue.ok_or_else(|| missing("caller queue"))?;
        let checker = self.checker.ok_or_else(|| missing("membership checker"))?;
        let logger = self.logger.ok_or_else(|| missing("call logger"))?;
        let line = self.line.ok_or_else(|| missing("line driver"))?;
        let recorder = self.recorder.ok_or_else(|| missing("message recorder"))?;

        let screener = ScreeningCoordinator::new(checker, self.config.screening.modes.iter().copied());
        let ring_timer = RingTimer::new(self.config.ring.per_ring_timeout());

        Ok(CallProcessingEngine {
            queue,
            screener,
            logger,
            dispatcher: AnswerDispatcher::new(line, recorder),
            ring_timer,
            ring_signal: self.ring_signal.unwrap_or_default(),
            approved_indicator: self
                .approved_indicator
                .unwrap_or_else(|| Arc::new(LogIndicator::new("approved"))),
            blocked_indicator: self
                .blocked_indicator
                .unwrap_or_else(|| Arc::new(LogIndicator::new("blocked"))),
            config: Arc::new(self.config),
            stats: Arc::new(EngineStats::default()),
            outcomes: self.outcomes,
        })
    }
}

fn missing(component: &str) -> AttendantError {
    AttendantError::config(format!("call processing engine requires a {}", component))
}
