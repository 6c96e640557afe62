//! In-memory whitelist/blacklist
//!
//! Exact number entries carry the reason that was recorded when the entry
//! was added. Name and number patterns are regular expressions matched
//! against the caller-ID fields; name patterns match case-insensitively.

use super::{MembershipChecker, MembershipVerdict};
use crate::caller::Caller;
use crate::config::ScreeningConfig;
use crate::error::{AttendantError, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use tracing::debug;

/// A compiled pattern and the reason reported when it matches
#[derive(Debug, Clone)]
struct PatternRule {
    regex: Regex,
    reason: String,
}

#[derive(Debug, Default)]
struct ListRules {
    numbers: HashMap<String, String>,
    name_patterns: Vec<PatternRule>,
    number_patterns: Vec<PatternRule>,
}

impl ListRules {
    fn lookup(&self, caller: &Caller) -> MembershipVerdict {
        if let Some(reason) = self.numbers.get(caller.number()) {
            return MembershipVerdict::matched(reason.clone());
        }
        if let Some(name) = caller.name() {
            if let Some(rule) = self.name_patterns.iter().find(|r| r.regex.is_match(name)) {
                return MembershipVerdict::matched(rule.reason.clone());
            }
        }
        if let Some(rule) = self
            .number_patterns
            .iter()
            .find(|r| r.regex.is_match(caller.number()))
        {
            return MembershipVerdict::matched(rule.reason.clone());
        }
        MembershipVerdict::no_match()
    }
}

/// [`MembershipChecker`] backed by in-memory lists that can be edited at runtime
#[derive(Debug, Default)]
pub struct ListScreener {
    whitelist: RwLock<ListRules>,
    blacklist: RwLock<ListRules>,
}

impl ListScreener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the lists from the `[screening]` configuration section
    pub fn from_config(config: &ScreeningConfig) -> Result<Self> {
        let screener = Self::new();
        for (number, reason) in &config.whitelist {
            screener.add_to_whitelist(number, reason);
        }
        for (number, reason) in &config.blacklist {
            screener.add_to_blacklist(number, reason);
        }
        for (pattern, reason) in &config.permit_name_patterns {
            screener.add_whitelist_name_pattern(pattern, reason)?;
        }
        for (pattern, reason) in &config.permit_number_patterns {
            screener.add_whitelist_number_pattern(pattern, reason)?;
        }
        for (pattern, reason) in &config.block_name_patterns {
            screener.add_blacklist_name_pattern(pattern, reason)?;
        }
        for (pattern, reason) in &config.block_number_patterns {
            screener.add_blacklist_number_pattern(pattern, reason)?;
        }
        Ok(screener)
    }

    pub fn add_to_whitelist(&self, number: &str, reason: &str) {
        debug!(number, reason, "Whitelist entry added");
        self.whitelist
            .write()
            .numbers
            .insert(number.to_string(), reason.to_string());
    }

    pub fn add_to_blacklist(&self, number: &str, reason: &str) {
        debug!(number, reason, "Blacklist entry added");
        self.blacklist
            .write()
            .numbers
            .insert(number.to_string(), reason.to_string());
    }

    pub fn add_whitelist_name_pattern(&self, pattern: &str, reason: &str) -> Result<()> {
        let rule = compile(pattern, reason, true)?;
        self.whitelist.write().name_patterns.push(rule);
        Ok(())
    }

    pub fn add_whitelist_number_pattern(&self, pattern: &str, reason: &str) -> Result<()> {
        let rule = compile(pattern, reason, false)?;
        self.whitelist.write().number_patterns.push(rule);
        Ok(())
    }

    pub fn add_blacklist_name_pattern(&self, pattern: &str, reason: &str) -> Result<()> {
        let rule = compile(pattern, reason, true)?;
        self.blacklist.write().name_patterns.push(rule);
        Ok(())
    }

    pub fn add_blacklist_number_pattern(&self, pattern: &str, reason: &str) -> Result<()> {
        let rule = compile(pattern, reason, false)?;
        self.blacklist.write().number_patterns.push(rule);
        Ok(())
    }

    pub fn whitelist_len(&self) -> usize {
        self.whitelist.read().numbers.len()
    }

    pub fn blacklist_len(&self) -> usize {
        self.blacklist.read().numbers.len()
    }
}

fn compile(pattern: &str, reason: &str, case_insensitive: bool) -> Result<PatternRule> {
    let regex = RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| AttendantError::config(format!("Invalid screening pattern '{}': {}", pattern, e)))?;
    Ok(PatternRule {
        regex,
        reason: reason.to_string(),
    })
}

#[async_trait]
impl MembershipChecker for ListScreener {
    async fn is_whitelisted(&self, caller: &Caller) -> Result<MembershipVerdict> {
        Ok(self.whitelist.read().lookup(caller))
    }

    async fn is_blacklisted(&self, caller: &Caller) -> Result<MembershipVerdict> {
        Ok(self.blacklist.read().lookup(caller))
    }
}
