//! Voice messaging interface
//!
//! Recording and the interactive voicemail menu run while the answer
//! dispatcher holds the line. Their audio mechanics live behind
//! [`MessageRecorder`].

use crate::caller::{CallId, Caller};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait MessageRecorder: Send + Sync {
    /// Record a message from the caller, filed under `call_id`
    async fn record_message(&self, call_id: CallId, caller: &Caller) -> Result<()>;

    /// Run the interactive voicemail menu for the caller
    async fn interactive_menu(&self, call_id: CallId, caller: &Caller) -> Result<()>;
}
