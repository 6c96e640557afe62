//! Telephone line driver interface
//!
//! The line is a single physical channel. Going off-hook is advisory
//! exclusive: the first party to pick up wins and everyone else is refused
//! immediately instead of waiting. [`HookSwitch`] implements that rule for
//! drivers that need it.

use crate::error::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

/// Hardware operations the answering side needs from the line
#[async_trait]
pub trait LineDriver: Send + Sync {
    /// Go off-hook. Returns `false` if the line is already in use.
    async fn pick_up(&self) -> bool;

    /// Go on-hook, releasing the line
    async fn hang_up(&self);

    /// Play an audio resource to the caller
    async fn play_audio(&self, resource: &str) -> Result<()>;
}

/// First-acquirer-wins hook state
#[derive(Debug, Default)]
pub struct HookSwitch {
    off_hook: AtomicBool,
}

impl HookSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to take the line. Never blocks.
    pub fn try_off_hook(&self) -> bool {
        self.off_hook
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Release the line
    pub fn on_hook(&self) {
        self.off_hook.store(false, Ordering::Release);
    }

    pub fn is_off_hook(&self) -> bool {
        self.off_hook.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_first_acquirer_wins() {
        let hook = HookSwitch::new();
        assert!(hook.try_off_hook());
        assert!(!hook.try_off_hook());
        assert!(hook.is_off_hook());

        hook.on_hook();
        assert!(!hook.is_off_hook());
        assert!(hook.try_off_hook());
    }

    #[test]
    fn test_only_one_thread_acquires() {
        let hook = Arc::new(HookSwitch::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let hook = hook.clone();
                std::thread::spawn(move || hook.try_off_hook())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
