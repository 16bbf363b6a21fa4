use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Error returned by a work item that observed cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("task cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Token that signals cancellation to cooperative work items.
///
/// Cloning a token creates another handle to the same flag. Calling
/// [`cancel()`](CancellationToken::cancel) on any clone affects all of them.
///
/// # Example
///
/// ```
/// use lumen_core::compute::CancellationToken;
///
/// let token = CancellationToken::new();
/// let worker_view = token.clone();
/// token.cancel();
/// assert!(worker_view.check().is_err());
/// ```
#[derive(Clone, Debug)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a new cancellation token (not cancelled).
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signals cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Clears the flag so the token can guard a new run.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }

    /// Returns whether cancellation has been signalled.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once cancellation has been signalled, for `?` at
    /// the top of a work item.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_shares_state() {
        let token1 = CancellationToken::new();
        let token2 = token1.clone();

        assert!(!token1.is_cancelled());
        token2.cancel();
        assert!(token1.is_cancelled());
        assert_eq!(token1.check(), Err(Cancelled));
    }

    #[test]
    fn reset_clears_flag() {
        let token = CancellationToken::new();
        token.cancel();
        token.reset();
        assert!(token.check().is_ok());
    }
}
