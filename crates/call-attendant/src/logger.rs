//! Call log
//!
//! Every call is logged before any answer attempt. The identifier returned
//! by [`CallLogger::log_caller`] ties later recordings back to the log entry.

use crate::caller::{CallCategory, CallId, Caller, Classification};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use parking_lot::RwLock;
use tracing::info;

/// Persists one entry per call
#[async_trait]
pub trait CallLogger: Send + Sync {
    async fn log_caller(&self, caller: &Caller, classification: &Classification) -> Result<CallId>;
}

/// A logged call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallLogEntry {
    pub call_id: CallId,
    pub number: String,
    pub name: Option<String>,
    pub category: CallCategory,
    pub reason: String,
    pub logged_at: DateTime<Local>,
}

/// Call log kept in memory, newest entries last
#[derive(Debug, Default)]
pub struct MemoryCallLog {
    entries: RwLock<Vec<CallLogEntry>>,
}

impl MemoryCallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn get(&self, call_id: CallId) -> Option<CallLogEntry> {
        self.entries
            .read()
            .iter()
            .find(|e| e.call_id == call_id)
            .cloned()
    }

    /// The `count` most recent entries, newest first
    pub fn recent(&self, count: usize) -> Vec<CallLogEntry> {
        self.entries.read().iter().rev().take(count).cloned().collect()
    }

    pub fn entries(&self) -> Vec<CallLogEntry> {
        self.entries.read().clone()
    }
}

#[async_trait]
impl CallLogger for MemoryCallLog {
    async fn log_caller(&self, caller: &Caller, classification: &Classification) -> Result<CallId> {
        let mut entries = self.entries.write();
        // Ids start at 1 and never repeat
        let call_id = CallId(entries.len() as u64 + 1);
        entries.push(CallLogEntry {
            call_id,
            number: caller.number().to_string(),
            name: caller.name().map(str::to_string),
            category: classification.category,
            reason: classification.reason.clone(),
            logged_at: Local::now(),
        });
        info!(
            call_id = %call_id,
            number = %caller.display_number(),
            category = %classification.category,
            reason = %classification.reason,
            "Call logged"
        );
        Ok(call_id)
    }
}
