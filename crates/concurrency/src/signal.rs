//! Cooperative stop signal for archival passes

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Requests a graceful stop of an in-flight pass
///
/// Clones share the same flag. The pass checks it before pulling each page
/// and before starting each record; migrations already under way finish.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    /// A signal that has not been triggered
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the pass to stop pulling new records
    pub fn request_stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Whether a stop was requested
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let signal = StopSignal::new();
        let observer = signal.clone();
        assert!(!observer.is_stopped());
        signal.request_stop();
        assert!(observer.is_stopped());
    }
}
