//! # Call Screening
//!
//! Screening decides which of three categories a caller falls into. The
//! decision is a pure function of the caller, the enabled screening modes
//! and the answers of a pluggable [`MembershipChecker`]:
//!
//! ```text
//!                 ┌──────────────┐
//!   Caller ──────▶│  whitelist?  │── match ──▶ Permitted
//!                 └──────┬───────┘
//!                        │ no match / mode disabled
//!                 ┌──────▼───────┐
//!                 │  blacklist?  │── match ──▶ Blocked
//!                 └──────┬───────┘
//!                        │ no match / mode disabled
//!                        ▼
//!                     Screened
//! ```
//!
//! A whitelist match short-circuits the blacklist entirely. The coordinator
//! never touches the line, the indicators or the call log; acting on the
//! classification is the engine's job.
//!
//! ## Example
//!
//! ```rust
//! use call_attendant::caller::{CallCategory, Caller};
//! use call_attendant::screening::{ListScreener, ScreeningCoordinator, ScreeningMode};
//! use std::sync::Arc;
//!
//! # async fn example() -> call_attendant::Result<()> {
//! let lists = ListScreener::new();
//! lists.add_to_blacklist("5559998888", "Telemarketer");
//!
//! let coordinator = ScreeningCoordinator::new(
//!     Arc::new(lists),
//!     [ScreeningMode::Whitelist, ScreeningMode::Blacklist],
//! );
//!
//! let classification = coordinator.classify(&Caller::new("5559998888")).await?;
//! assert_eq!(classification.category, CallCategory::Blocked);
//! # Ok(())
//! # }
//! ```

pub mod lists;

pub use lists::ListScreener;

use crate::caller::{Caller, Classification};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A screening check that can be switched on in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreeningMode {
    Whitelist,
    Blacklist,
}

impl fmt::Display for ScreeningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreeningMode::Whitelist => f.write_str("whitelist"),
            ScreeningMode::Blacklist => f.write_str("blacklist"),
        }
    }
}

/// Answer from a membership lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipVerdict {
    pub matched: bool,
    pub reason: String,
}

impl MembershipVerdict {
    pub fn matched(reason: impl Into<String>) -> Self {
        Self {
            matched: true,
            reason: reason.into(),
        }
    }

    pub fn no_match() -> Self {
        Self {
            matched: false,
            reason: String::new(),
        }
    }
}

/// Whitelist/blacklist membership test
#[async_trait]
pub trait MembershipChecker: Send + Sync {
    async fn is_whitelisted(&self, caller: &Caller) -> Result<MembershipVerdict>;

    async fn is_blacklisted(&self, caller: &Caller) -> Result<MembershipVerdict>;
}

/// Assigns exactly one [`Classification`] to each caller
pub struct ScreeningCoordinator {
    checker: Arc<dyn MembershipChecker>,
    modes: BTreeSet<ScreeningMode>,
}

impl ScreeningCoordinator {
    pub fn new(
        checker: Arc<dyn MembershipChecker>,
        modes: impl IntoIterator<Item = ScreeningMode>,
    ) -> Self {
        Self {
            checker,
            modes: modes.into_iter().collect(),
        }
    }

    pub fn is_enabled(&self, mode: ScreeningMode) -> bool {
        self.modes.contains(&mode)
    }

    pub fn modes(&self) -> impl Iterator<Item = ScreeningMode> + '_ {
        self.modes.iter().copied()
    }

    /// Classify a caller.
    ///
    /// Lookup failures are returned to the caller untouched.
    pub async fn classify(&self, caller: &Caller) -> Result<Classification> {
        if self.is_enabled(ScreeningMode::Whitelist) {
            debug!(number = %caller.number(), "Checking whitelist");
            let verdict = self.checker.is_whitelisted(caller).await?;
            if verdict.matched {
                return Ok(Classification::permitted(verdict.reason));
            }
        }

        if self.is_enabled(ScreeningMode::Blacklist) {
            debug!(number = %caller.number(), "Checking blacklist");
            let verdict = self.checker.is_blacklisted(caller).await?;
            if verdict.matched {
                return Ok(Classification::blocked(verdict.reason));
            }
        }

        Ok(Classification::screened())
    }
}
