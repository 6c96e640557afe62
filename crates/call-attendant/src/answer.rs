//! # Answer Dispatcher
//!
//! Executes the answer actions configured for a call's category while
//! holding the line off-hook.
//!
//! ```text
//!   pick_up() ── false ──▶ LineBusy (nothing executed, not an error)
//!      │
//!     true
//!      ▼
//!   greeting ──▶ record_message ─┐
//!      │        (or voice_mail) ─┤── first failure stops the sequence
//!      ▼                         ▼
//!   hang_up()  ◀── always, exactly once ──
//! ```
//!
//! Actions report a per-action [`ActionOutcome`] instead of unwinding, so
//! the release step sits on the only path out of [`AnswerDispatcher::run`].
//! A panicking action is caught and reported as a failure as well.

use crate::caller::{CallRecord, Caller};
use crate::line::LineDriver;
use crate::messaging::MessageRecorder;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{info, warn};

/// A single answer behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerAction {
    Greeting,
    RecordMessage,
    VoiceMail,
}

impl AnswerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerAction::Greeting => "greeting",
            AnswerAction::RecordMessage => "record_message",
            AnswerAction::VoiceMail => "voice_mail",
        }
    }
}

impl fmt::Display for AnswerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do when answering a call of a given category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPlan {
    actions: Vec<AnswerAction>,
    greeting: Option<String>,
    rings_before_answer: u32,
}

impl ActionPlan {
    /// Build a plan. Duplicate actions are dropped, first occurrence wins.
    pub fn new(
        actions: impl IntoIterator<Item = AnswerAction>,
        greeting: Option<String>,
        rings_before_answer: u32,
    ) -> Self {
        let mut unique = Vec::new();
        for action in actions {
            if !unique.contains(&action) {
                unique.push(action);
            }
        }
        Self {
            actions: unique,
            greeting,
            rings_before_answer,
        }
    }

    pub fn actions(&self) -> &[AnswerAction] {
        &self.actions
    }

    pub fn contains(&self, action: AnswerAction) -> bool {
        self.actions.contains(&action)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn greeting(&self) -> Option<&str> {
        self.greeting.as_deref()
    }

    pub fn rings_before_answer(&self) -> u32 {
        self.rings_before_answer
    }

    /// Actions in execution order.
    ///
    /// Greeting first, then either record_message or voice_mail; recording
    /// takes precedence when both are configured.
    pub fn steps(&self) -> Vec<AnswerAction> {
        let mut steps = Vec::with_capacity(2);
        if self.contains(AnswerAction::Greeting) {
            steps.push(AnswerAction::Greeting);
        }
        if self.contains(AnswerAction::RecordMessage) {
            steps.push(AnswerAction::RecordMessage);
        } else if self.contains(AnswerAction::VoiceMail) {
            steps.push(AnswerAction::VoiceMail);
        }
        steps
    }
}

/// Result of one answer action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    Failed { reason: String },
}

impl From<crate::error::Result<()>> for ActionOutcome {
    fn from(result: crate::error::Result<()>) -> Self {
        match result {
            Ok(()) => ActionOutcome::Completed,
            Err(e) => ActionOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }
}

/// Result of a dispatch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The line was already off-hook; nothing was executed
    LineBusy,
    /// Every step ran
    Completed { actions: Vec<AnswerAction> },
    /// A step failed; `completed` lists the steps that ran before it
    ActionFailed {
        action: AnswerAction,
        reason: String,
        completed: Vec<AnswerAction>,
    },
}

impl DispatchOutcome {
    pub fn executed(&self, action: AnswerAction) -> bool {
        match self {
            DispatchOutcome::LineBusy => false,
            DispatchOutcome::Completed { actions } => actions.contains(&action),
            DispatchOutcome::ActionFailed { completed, .. } => completed.contains(&action),
        }
    }
}

/// Runs action plans with exclusive use of the line
pub struct AnswerDispatcher {
    line: Arc<dyn LineDriver>,
    recorder: Arc<dyn MessageRecorder>,
}

impl AnswerDispatcher {
    pub fn new(line: Arc<dyn LineDriver>, recorder: Arc<dyn MessageRecorder>) -> Self {
        Self { line, recorder }
    }

    /// Answer the call and execute `plan`.
    ///
    /// The line is released before returning whenever it was acquired.
    pub async fn run(&self, plan: &ActionPlan, record: &CallRecord, caller: &Caller) -> DispatchOutcome {
        if !self.line.pick_up().await {
            info!(
                number = %caller.display_number(),
                call_id = %record.call_id,
                "Line already off-hook; not answering"
            );
            return DispatchOutcome::LineBusy;
        }

        let outcome = self.execute(plan, record, caller).await;
        self.line.hang_up().await;
        outcome
    }

    async fn execute(&self, plan: &ActionPlan, record: &CallRecord, caller: &Caller) -> DispatchOutcome {
        let mut completed = Vec::new();
        for action in plan.steps() {
            info!(action = %action, call_id = %record.call_id, "Executing answer action");
            let outcome = AssertUnwindSafe(self.perform(action, plan, record, caller))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| ActionOutcome::Failed {
                    reason: "action panicked".to_string(),
                });
            match outcome {
                ActionOutcome::Completed => completed.push(action),
                ActionOutcome::Failed { reason } => {
                    warn!(
                        number = %caller.display_number(),
                        category = %record.classification.category,
                        call_id = %record.call_id,
                        action = %action,
                        %reason,
                        "Answer action failed; abandoning remaining actions"
                    );
                    return DispatchOutcome::ActionFailed {
                        action,
                        reason,
                        completed,
                    };
                }
            }
        }
        DispatchOutcome::Completed { actions: completed }
    }

    async fn perform(
        &self,
        action: AnswerAction,
        plan: &ActionPlan,
        record: &CallRecord,
        caller: &Caller,
    ) -> ActionOutcome {
        match action {
            AnswerAction::Greeting => match plan.greeting() {
                Some(greeting) => self.line.play_audio(greeting).await.into(),
                None => ActionOutcome::Failed {
                    reason: "no greeting configured".to_string(),
                },
            },
            AnswerAction::RecordMessage => self
                .recorder
                .record_message(record.call_id, caller)
                .await
                .into(),
            AnswerAction::VoiceMail => self
                .recorder
                .interactive_menu(record.call_id, caller)
                .await
                .into(),
        }
    }
}
