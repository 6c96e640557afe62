//! Configuration for the call attendant
//!
//! Configuration is read from a TOML file. Every section is optional and
//! falls back to the defaults below.
//!
//! ```toml
//! [screening]
//! modes = ["whitelist", "blacklist"]
//!
//! [screening.whitelist]
//! "5551234567" = "Mom"
//!
//! [screening.blacklist]
//! "5559998888" = "Extended warranty"
//!
//! [screening.block_name_patterns]
//! "^V[0-9]{6,}" = "Spoofed name"
//!
//! [ring]
//! per_ring_timeout_ms = 7000
//!
//! [permitted]
//! actions = ["greeting", "record_message"]
//! greeting_file = "/var/lib/callattendant/general_greeting.wav"
//! rings_before_answer = 4
//!
//! [blocked]
//! actions = ["greeting"]
//! greeting_file = "/var/lib/callattendant/blocked_greeting.wav"
//! rings_before_answer = 0
//!
//! [screened]
//! actions = ["greeting", "record_message"]
//! greeting_file = "/var/lib/callattendant/general_greeting.wav"
//! rings_before_answer = 0
//!
//! [logging]
//! level = "info"
//! json = false
//! ```

use crate::answer::{ActionPlan, AnswerAction};
use crate::caller::CallCategory;
use crate::error::{AttendantError, Result};
use crate::ring::DEFAULT_PER_RING_TIMEOUT;
use crate::screening::ScreeningMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Highest ring count accepted before answering
pub const MAX_RINGS_BEFORE_ANSWER: u32 = 20;

/// Longest accepted per-ring timeout
pub const MAX_PER_RING_TIMEOUT: Duration = Duration::from_secs(60);

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendantConfig {
    pub screening: ScreeningConfig,
    pub ring: RingConfig,
    pub permitted: CategoryConfig,
    pub blocked: CategoryConfig,
    pub screened: CategoryConfig,
    pub logging: LoggingSettings,
}

/// Screening modes and list contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreeningConfig {
    pub modes: Vec<ScreeningMode>,
    /// Number → reason
    pub whitelist: BTreeMap<String, String>,
    /// Number → reason
    pub blacklist: BTreeMap<String, String>,
    /// Regex on caller name → reason
    pub permit_name_patterns: BTreeMap<String, String>,
    /// Regex on caller number → reason
    pub permit_number_patterns: BTreeMap<String, String>,
    pub block_name_patterns: BTreeMap<String, String>,
    pub block_number_patterns: BTreeMap<String, String>,
}

/// Ring cadence settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Must exceed one full ring cycle (pulse plus silence) for the region
    pub per_ring_timeout_ms: u64,
}

/// Answer behavior for one screening category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub actions: Vec<AnswerAction>,
    #[serde(default)]
    pub greeting_file: Option<String>,
    pub rings_before_answer: u32,
}

/// Logging output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
    pub file_info: bool,
}

impl Default for AttendantConfig {
    fn default() -> Self {
        Self {
            screening: ScreeningConfig::default(),
            ring: RingConfig::default(),
            permitted: CategoryConfig {
                actions: vec![AnswerAction::Greeting, AnswerAction::RecordMessage],
                greeting_file: Some("general_greeting.wav".to_string()),
                rings_before_answer: 4,
            },
            blocked: CategoryConfig {
                actions: vec![AnswerAction::Greeting],
                greeting_file: Some("blocked_greeting.wav".to_string()),
                rings_before_answer: 0,
            },
            screened: CategoryConfig {
                actions: vec![AnswerAction::Greeting, AnswerAction::RecordMessage],
                greeting_file: Some("general_greeting.wav".to_string()),
                rings_before_answer: 0,
            },
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            modes: vec![ScreeningMode::Whitelist, ScreeningMode::Blacklist],
            whitelist: BTreeMap::new(),
            blacklist: BTreeMap::new(),
            permit_name_patterns: BTreeMap::new(),
            permit_number_patterns: BTreeMap::new(),
            block_name_patterns: BTreeMap::new(),
            block_number_patterns: BTreeMap::new(),
        }
    }
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            per_ring_timeout_ms: DEFAULT_PER_RING_TIMEOUT.as_millis() as u64,
        }
    }
}

impl RingConfig {
    pub fn per_ring_timeout(&self) -> Duration {
        Duration::from_millis(self.per_ring_timeout_ms)
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_info: false,
        }
    }
}

impl AttendantConfig {
    /// Load and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration text without validating it
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Settings for a screening category
    pub fn category(&self, category: CallCategory) -> &CategoryConfig {
        match category {
            CallCategory::Permitted => &self.permitted,
            CallCategory::Blocked => &self.blocked,
            CallCategory::Screened => &self.screened,
        }
    }

    /// Build a fresh action plan for a category
    pub fn plan_for(&self, category: CallCategory) -> ActionPlan {
        let settings = self.category(category);
        ActionPlan::new(
            settings.actions.iter().copied(),
            settings.greeting_file.clone(),
            settings.rings_before_answer,
        )
    }

    /// Check the configuration for values the engine cannot honor
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        let timeout = self.ring.per_ring_timeout();
        if timeout.is_zero() || timeout > MAX_PER_RING_TIMEOUT {
            problems.push(format!(
                "ring.per_ring_timeout_ms must be between 1 and {}",
                MAX_PER_RING_TIMEOUT.as_millis()
            ));
        }

        for category in [CallCategory::Permitted, CallCategory::Blocked, CallCategory::Screened] {
            let section = category.as_str().to_lowercase();
            let settings = self.category(category);

            if settings.rings_before_answer > MAX_RINGS_BEFORE_ANSWER {
                problems.push(format!(
                    "{}.rings_before_answer must be at most {}",
                    section, MAX_RINGS_BEFORE_ANSWER
                ));
            }

            let greets = settings.actions.contains(&AnswerAction::Greeting);
            let has_greeting = settings
                .greeting_file
                .as_deref()
                .is_some_and(|f| !f.trim().is_empty());
            if greets && !has_greeting {
                problems.push(format!(
                    "{}.greeting_file is required when 'greeting' is an action",
                    section
                ));
            }

            if settings.actions.contains(&AnswerAction::RecordMessage)
                && settings.actions.contains(&AnswerAction::VoiceMail)
            {
                warn!(
                    section = %section,
                    "Both record_message and voice_mail configured; voice_mail will not run"
                );
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(AttendantError::config(problems.join("; ")))
        }
    }

    /// Check that every greeting file referenced by an answering category exists
    pub fn check_greeting_files(&self) -> Result<()> {
        let missing: Vec<String> = [&self.permitted, &self.blocked, &self.screened]
            .into_iter()
            .filter(|c| c.actions.contains(&AnswerAction::Greeting))
            .filter_map(|c| c.greeting_file.as_deref())
            .filter(|f| !Path::new(f).is_file())
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AttendantError::config(format!(
                "greeting file(s) not found: {}",
                missing.join(", ")
            )))
        }
    }
}
