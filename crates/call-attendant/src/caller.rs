//! Caller identity and classification types
//!
//! A [`Caller`] is built once from the caller-ID report the line delivers and
//! is never changed afterwards. Screening turns it into a [`Classification`],
//! and the call logger pairs that classification with a [`CallId`] to form a
//! [`CallRecord`].

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of value the caller-ID number field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    /// Ordinary dialable digits
    Digits,
    /// Caller withheld the number ("P" / "PRIVATE")
    Private,
    /// Number unavailable or caller is out of area ("O" / "OUT-OF-AREA")
    Unavailable,
    /// Anything else the line handed us
    Malformed,
}

/// An incoming caller as reported by the line's caller-ID signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    number: String,
    name: Option<String>,
    date: Option<String>,
    time: Option<String>,
    received_at: DateTime<Local>,
    ring_mark: Option<u64>,
}

impl Caller {
    /// Create a caller from the raw number field
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into().trim().to_string(),
            name: None,
            date: None,
            time: None,
            received_at: Local::now(),
            ring_mark: None,
        }
    }

    /// Attach the caller-ID name field
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into().trim().to_string();
        self.name = if name.is_empty() { None } else { Some(name) };
        self
    }

    /// Stamp the ring-signal total at the ring that carried this caller-ID.
    ///
    /// Rings raised after the mark count toward answering even if they
    /// arrive before the engine starts waiting.
    pub fn with_ring_mark(mut self, rings_raised: u64) -> Self {
        self.ring_mark = Some(rings_raised);
        self
    }

    /// Attach the date (MMDD) and time (HHMM) fields reported by the line
    pub fn with_date_time(mut self, date: impl Into<String>, time: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self.time = Some(time.into());
        self
    }

    /// Raw number field exactly as received
    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }

    /// When the caller entered the system
    pub fn received_at(&self) -> DateTime<Local> {
        self.received_at
    }

    pub fn ring_mark(&self) -> Option<u64> {
        self.ring_mark
    }

    /// Classify the number field without rejecting anything
    pub fn number_kind(&self) -> NumberKind {
        match self.number.to_ascii_uppercase().as_str() {
            "P" | "PRIVATE" | "BLOCKED" => NumberKind::Private,
            "O" | "OUT-OF-AREA" | "UNAVAILABLE" | "UNKNOWN" => NumberKind::Unavailable,
            n if !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()) => NumberKind::Digits,
            _ => NumberKind::Malformed,
        }
    }

    /// Number formatted for logs and indicators.
    ///
    /// Ten digit numbers become `555-123-4567` and seven digit numbers
    /// `123-4567`. Markers and malformed values are passed through unchanged.
    pub fn display_number(&self) -> String {
        if self.number_kind() != NumberKind::Digits {
            return self.number.clone();
        }
        let n = &self.number;
        match n.len() {
            10 => format!("{}-{}-{}", &n[0..3], &n[3..6], &n[6..]),
            11 if n.starts_with('1') => format!("1-{}-{}-{}", &n[1..4], &n[4..7], &n[7..]),
            7 => format!("{}-{}", &n[0..3], &n[3..]),
            _ => n.clone(),
        }
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", self.display_number(), name),
            None => write!(f, "{}", self.display_number()),
        }
    }
}

/// Screening category assigned to every call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallCategory {
    Permitted,
    Blocked,
    Screened,
}

impl CallCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallCategory::Permitted => "Permitted",
            CallCategory::Blocked => "Blocked",
            CallCategory::Screened => "Screened",
        }
    }
}

impl fmt::Display for CallCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of screening a caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: CallCategory,
    /// Human readable reason, empty for the default screened outcome
    pub reason: String,
}

impl Classification {
    pub fn permitted(reason: impl Into<String>) -> Self {
        Self {
            category: CallCategory::Permitted,
            reason: reason.into(),
        }
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            category: CallCategory::Blocked,
            reason: reason.into(),
        }
    }

    /// Default outcome when no screening rule matched
    pub fn screened() -> Self {
        Self {
            category: CallCategory::Screened,
            reason: String::new(),
        }
    }
}

/// Identifier assigned by the call logger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallId(pub u64);

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A logged call: its classification plus the logger's identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    pub call_id: CallId,
    pub classification: Classification,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_number_formats_north_american_numbers() {
        assert_eq!(Caller::new("5551234567").display_number(), "555-123-4567");
        assert_eq!(Caller::new("15551234567").display_number(), "1-555-123-4567");
        assert_eq!(Caller::new("1234567").display_number(), "123-4567");
        assert_eq!(Caller::new("12345").display_number(), "12345");
    }

    #[test]
    fn test_markers_pass_through_unchanged() {
        let private = Caller::new("P");
        assert_eq!(private.number_kind(), NumberKind::Private);
        assert_eq!(private.display_number(), "P");

        let out_of_area = Caller::new("O");
        assert_eq!(out_of_area.number_kind(), NumberKind::Unavailable);

        let junk = Caller::new("55-X");
        assert_eq!(junk.number_kind(), NumberKind::Malformed);
        assert_eq!(junk.display_number(), "55-X");
    }

    #[test]
    fn test_empty_name_is_dropped() {
        let caller = Caller::new("5551234567").with_name("  ");
        assert_eq!(caller.name(), None);

        let caller = Caller::new("5551234567").with_name("JOHN DOE");
        assert_eq!(caller.name(), Some("JOHN DOE"));
        assert_eq!(caller.to_string(), "555-123-4567 (JOHN DOE)");
    }

    #[test]
    fn test_screened_default_has_empty_reason() {
        let c = Classification::screened();
        assert_eq!(c.category, CallCategory::Screened);
        assert!(c.reason.is_empty());
    }
}
