//! Cooperative cancellation shared by all tasks of a run

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How many rows a task processes between cancellation checks
pub const CHECK_INTERVAL: u64 = 4096;

/// Cloneable cancellation flag
///
/// Set by the task pool when a sibling fails, or by the signal handler.
/// Long-running tasks poll it every [`CHECK_INTERVAL`] rows.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Check on every [`CHECK_INTERVAL`]-th row only
    pub fn should_stop(&self, row: u64) -> bool {
        row % CHECK_INTERVAL == 0 && self.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        assert!(clone.is_cancelled());
        assert!(clone.should_stop(0));
        assert!(!clone.should_stop(1));
    }
}
