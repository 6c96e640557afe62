//! Shared fixtures for the call attendant integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use call_attendant::indicator::CountingIndicator;
use call_attendant::prelude::*;
use call_attendant::screening::MembershipVerdict;
use call_attendant::simulated::LineEvent;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Recorder whose actions can be made to fail or panic
#[derive(Default)]
pub struct ScriptedRecorder {
    pub fail_record: bool,
    pub panic_record: bool,
    pub fail_menu: bool,
    pub messages: Mutex<Vec<CallId>>,
    pub menus: Mutex<Vec<CallId>>,
}

#[async_trait]
impl MessageRecorder for ScriptedRecorder {
    async fn record_message(&self, call_id: CallId, _caller: &Caller) -> Result<()> {
        if self.panic_record {
            panic!("recorder crashed");
        }
        if self.fail_record {
            return Err(AttendantError::action("record_message", "microphone unplugged"));
        }
        self.messages.lock().push(call_id);
        Ok(())
    }

    async fn interactive_menu(&self, call_id: CallId, _caller: &Caller) -> Result<()> {
        if self.fail_menu {
            return Err(AttendantError::action("voice_mail", "menu crashed"));
        }
        self.menus.lock().push(call_id);
        Ok(())
    }
}

/// Membership checker whose lookups always fail
pub struct BrokenChecker;

#[async_trait]
impl MembershipChecker for BrokenChecker {
    async fn is_whitelisted(&self, _caller: &Caller) -> Result<MembershipVerdict> {
        Err(AttendantError::screening("whitelist", "database is locked"))
    }

    async fn is_blacklisted(&self, _caller: &Caller) -> Result<MembershipVerdict> {
        Err(AttendantError::screening("blacklist", "database is locked"))
    }
}

/// Call logger that always fails
pub struct BrokenLogger;

#[async_trait]
impl CallLogger for BrokenLogger {
    async fn log_caller(&self, _caller: &Caller, _classification: &Classification) -> Result<CallId> {
        Err(AttendantError::call_log("disk full"))
    }
}

/// An engine wired to in-process collaborators
pub struct Harness {
    pub engine: CallProcessingEngine,
    pub sender: CallerSender,
    pub ring: RingSignal,
    pub line: Arc<SimulatedLine>,
    pub recorder: Arc<ScriptedRecorder>,
    pub log: Arc<MemoryCallLog>,
    pub approved: Arc<CountingIndicator>,
    pub blocked: Arc<CountingIndicator>,
    pub outcomes: mpsc::UnboundedReceiver<CallOutcome>,
}

pub struct HarnessBuilder {
    pub config: AttendantConfig,
    pub checker: Option<Arc<dyn MembershipChecker>>,
    pub logger: Option<Arc<dyn CallLogger>>,
    pub recorder: ScriptedRecorder,
}

impl HarnessBuilder {
    pub fn new(config: AttendantConfig) -> Self {
        Self {
            config,
            checker: None,
            logger: None,
            recorder: ScriptedRecorder::default(),
        }
    }

    pub fn checker(mut self, checker: Arc<dyn MembershipChecker>) -> Self {
        self.checker = Some(checker);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn CallLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn recorder(mut self, recorder: ScriptedRecorder) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn build(self) -> Harness {
        let (sender, queue) = caller_queue();
        let (outcome_tx, outcomes) = mpsc::unbounded_channel();
        let ring = RingSignal::new();
        let line = Arc::new(SimulatedLine::new());
        let recorder = Arc::new(self.recorder);
        let log = Arc::new(MemoryCallLog::new());
        let approved = Arc::new(CountingIndicator::new());
        let blocked = Arc::new(CountingIndicator::new());

        let checker: Arc<dyn MembershipChecker> = match self.checker {
            Some(checker) => checker,
            None => Arc::new(
                ListScreener::from_config(&self.config.screening).expect("valid screening lists"),
            ),
        };
        let logger: Arc<dyn CallLogger> = match self.logger {
            Some(logger) => logger,
            None => log.clone(),
        };

        let engine = CallProcessingEngine::builder(self.config)
            .with_queue(queue)
            .with_ring_signal(ring.clone())
            .with_membership_checker(checker)
            .with_call_logger(logger)
            .with_line(line.clone())
            .with_recorder(recorder.clone())
            .with_approved_indicator(approved.clone())
            .with_blocked_indicator(blocked.clone())
            .with_outcome_sink(outcome_tx)
            .build()
            .expect("engine builds");

        Harness {
            engine,
            sender,
            ring,
            line,
            recorder,
            log,
            approved,
            blocked,
            outcomes,
        }
    }
}

/// Default configuration with the two numbers used throughout the tests
pub fn test_config() -> AttendantConfig {
    let mut config = AttendantConfig::default();
    config
        .screening
        .whitelist
        .insert("5551234567".to_string(), "Friends and family".to_string());
    config
        .screening
        .blacklist
        .insert("5559998888".to_string(), "Known telemarketer".to_string());
    config
}

/// Raise `count` ring pulses, one every `period`
pub fn ring_later(signal: &RingSignal, period: Duration, count: usize) {
    let signal = signal.clone();
    tokio::spawn(async move {
        for _ in 0..count {
            tokio::time::sleep(period).await;
            signal.raise();
        }
    });
}

pub fn count_events(line: &SimulatedLine, event: &LineEvent) -> usize {
    line.events().iter().filter(|e| *e == event).count()
}
