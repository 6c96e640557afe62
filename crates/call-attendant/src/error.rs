//! Error types for the call attendant
//!
//! Every fallible operation in the crate returns [`Result`]. The engine
//! contains per-call errors at the call boundary; only
//! [`AttendantError::IngestionClosed`] is treated as fatal.

use thiserror::Error;

/// Result type for call attendant operations
pub type Result<T> = std::result::Result<T, AttendantError>;

/// Errors that can occur while screening and answering calls
#[derive(Debug, Error)]
pub enum AttendantError {
    /// Invalid or inconsistent configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Configuration file could not be parsed
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A membership lookup (whitelist/blacklist) failed
    #[error("Screening error during {list} lookup: {message}")]
    Screening { list: String, message: String },

    /// The call logger could not record a call
    #[error("Call log error: {message}")]
    CallLog { message: String },

    /// An answer action failed while the line was off-hook
    #[error("Answer action '{action}' failed: {message}")]
    Action { action: String, message: String },

    /// The line driver reported a hardware fault
    #[error("Hardware error: {message}")]
    Hardware { message: String },

    /// Every producer of callers is gone; no further calls can arrive
    #[error("Caller ingestion closed")]
    IngestionClosed,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AttendantError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a screening error for the named list
    pub fn screening(list: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Screening {
            list: list.into(),
            message: message.into(),
        }
    }

    /// Create a call log error
    pub fn call_log(message: impl Into<String>) -> Self {
        Self::CallLog {
            message: message.into(),
        }
    }

    /// Create an answer action error
    pub fn action(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Action {
            action: action.into(),
            message: message.into(),
        }
    }

    /// Create a hardware error
    pub fn hardware(message: impl Into<String>) -> Self {
        Self::Hardware {
            message: message.into(),
        }
    }

    /// Whether this error means the engine can no longer receive calls
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::IngestionClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_ingestion_closed_is_fatal() {
        assert!(AttendantError::IngestionClosed.is_fatal());
        assert!(!AttendantError::screening("whitelist", "db locked").is_fatal());
        assert!(!AttendantError::action("greeting", "missing file").is_fatal());
        assert!(!AttendantError::hardware("modem reset").is_fatal());
    }

    #[test]
    fn test_error_messages_carry_context() {
        let err = AttendantError::screening("blacklist", "connection lost");
        assert_eq!(
            err.to_string(),
            "Screening error during blacklist lookup: connection lost"
        );

        let err = AttendantError::action("record_message", "disk full");
        assert_eq!(err.to_string(), "Answer action 'record_message' failed: disk full");
    }
}
