//! De-duplicated logging for per-frame configuration problems.
//!
//! A system that runs every frame would otherwise repeat the same warning
//! sixty times a second. [`LogOnce`] remembers which keys were already
//! reported; [`reset`](LogOnce::reset) re-arms a key once the condition
//! clears.

use std::collections::HashSet;

use parking_lot::Mutex;

/// Registry of log keys that were already emitted.
#[derive(Default)]
pub struct LogOnce {
    emitted: Mutex<HashSet<String>>,
}

impl LogOnce {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs `message` at warn level the first time `key` is seen.
    pub fn warn(&self, key: &str, message: impl std::fmt::Display) {
        if self.mark(key) {
            log::warn!("{message}");
        }
    }

    /// Logs `message` at error level the first time `key` is seen.
    pub fn error(&self, key: &str, message: impl std::fmt::Display) {
        if self.mark(key) {
            log::error!("{message}");
        }
    }

    /// Re-arms `key`.
    pub fn reset(&self, key: &str) {
        self.emitted.lock().remove(key);
    }

    /// Returns `true` if `key` was already reported.
    pub fn is_emitted(&self, key: &str) -> bool {
        self.emitted.lock().contains(key)
    }

    fn mark(&self, key: &str) -> bool {
        let mut emitted = self.emitted.lock();
        if emitted.contains(key) {
            false
        } else {
            emitted.insert(key.to_owned());
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_reported_once_until_reset() {
        let once = LogOnce::new();
        assert!(once.mark("missing_store"));
        assert!(!once.mark("missing_store"));
        once.reset("missing_store");
        assert!(!once.is_emitted("missing_store"));
        once.warn("missing_store", "store missing");
        assert!(once.is_emitted("missing_store"));
    }
}
