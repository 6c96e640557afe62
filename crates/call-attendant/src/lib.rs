//! # Call Attendant
//!
//! An unattended call screening and answering engine for a single telephone
//! line. Each incoming caller is classified against whitelist/blacklist
//! rules, logged, and (once the configured number of rings has passed)
//! answered with a per-category sequence of actions: a greeting, a recorded
//! message or an interactive voicemail menu.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                      Line hardware side                       │
//! │   caller-ID decode ── CallerSender::push     RingSignal::raise│
//! └───────────────┬───────────────────────────────────┬───────────┘
//!                 │                                   │
//! ┌───────────────▼───────────────────────────────────▼───────────┐
//! │                    CallProcessingEngine                       │
//! │  CallerQueue → ScreeningCoordinator → CallLogger → RingTimer  │
//! │                                    → AnswerDispatcher         │
//! └───────────────┬──────────────────────┬────────────────────────┘
//!                 │                      │
//!        ┌────────▼───────┐     ┌────────▼────────┐
//!        │   LineDriver   │     │ MessageRecorder │
//!        │ pick_up/hang_up│     │ record / menu   │
//!        │   play_audio   │     └─────────────────┘
//!        └────────────────┘
//! ```
//!
//! The hardware driver, membership storage, call log, recorder and
//! indicators are traits; [`simulated`], [`screening::ListScreener`] and
//! [`logger::MemoryCallLog`] provide in-process implementations.
//!
//! ## Quick Start
//!
//! ```rust
//! use call_attendant::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> call_attendant::Result<()> {
//! let mut config = AttendantConfig::default();
//! config.screening.whitelist.insert("5551234567".into(), "Mom".into());
//!
//! let (sender, queue) = caller_queue();
//! let lists = ListScreener::from_config(&config.screening)?;
//!
//! let engine = CallProcessingEngine::builder(config)
//!     .with_queue(queue)
//!     .with_membership_checker(Arc::new(lists))
//!     .with_call_logger(Arc::new(MemoryCallLog::new()))
//!     .with_line(Arc::new(SimulatedLine::new()))
//!     .with_recorder(Arc::new(LoggingRecorder::new()))
//!     .build()?;
//!
//! let outcome = engine.process_call(Caller::new("5559998888")).await;
//! assert_eq!(outcome.classification.category, CallCategory::Screened);
//! # drop(sender);
//! # Ok(())
//! # }
//! ```

pub mod answer;
pub mod caller;
pub mod config;
pub mod engine;
pub mod error;
pub mod indicator;
pub mod line;
pub mod logger;
pub mod logging;
pub mod messaging;
pub mod queue;
pub mod ring;
pub mod screening;
pub mod simulated;

pub use error::{AttendantError, Result};

/// Commonly used types
pub mod prelude {
    pub use crate::answer::{ActionPlan, AnswerAction, AnswerDispatcher, DispatchOutcome};
    pub use crate::caller::{CallCategory, CallId, CallRecord, Caller, Classification};
    pub use crate::config::AttendantConfig;
    pub use crate::engine::{CallOutcome, CallProcessingEngine, EngineStats};
    pub use crate::error::{AttendantError, Result};
    pub use crate::indicator::{Indicator, LogIndicator};
    pub use crate::line::LineDriver;
    pub use crate::logger::{CallLogger, MemoryCallLog};
    pub use crate::messaging::MessageRecorder;
    pub use crate::queue::{caller_queue, CallerQueue, CallerSender};
    pub use crate::ring::{RingSignal, RingTimer, RingWaitResult};
    pub use crate::screening::{ListScreener, MembershipChecker, ScreeningCoordinator, ScreeningMode};
    pub use crate::simulated::{CallerIdFeed, LoggingRecorder, SimulatedLine};
}
