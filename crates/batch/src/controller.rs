//! Cooperative cancellation shared by every participant of one run.
//!
//! The engines only look at the flag at the top of each iteration, so an
//! abort never interrupts an in-flight request; it prevents the next one
//! from being scheduled. Timed waits inside handlers go through
//! [`Controller::sleep`] so they end as soon as the run is aborted.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Abort signal for one batch run. Clones share the same signal.
#[derive(Debug, Clone, Default)]
pub struct Controller {
    token: CancellationToken,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal every holder of this controller. Idempotent.
    pub fn abort(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!("Batch run aborted");
        }
        self.token.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once `abort` has been called.
    pub async fn aborted(&self) {
        self.token.cancelled().await
    }

    /// Wait for `duration` unless the run is aborted first.
    ///
    /// Returns `true` if the full duration elapsed, `false` if the wait was
    /// cut short (or never started) because of an abort.
    pub async fn sleep(&self, duration: Duration) -> bool {
        if self.is_aborted() {
            return false;
        }
        tokio::select! {
            () = tokio::time::sleep(duration) => true,
            () = self.token.cancelled() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_abort_is_shared_between_clones() {
        let controller = Controller::new();
        let handle = controller.clone();
        assert!(!controller.is_aborted());

        handle.abort();
        assert!(controller.is_aborted());

        // idempotent
        handle.abort();
        assert!(controller.is_aborted());
    }

    #[tokio::test]
    async fn test_sleep_completes_when_not_aborted() {
        let controller = Controller::new();
        assert!(controller.sleep(Duration::from_millis(5)).await);
    }

    #[tokio::test]
    async fn test_sleep_returns_immediately_after_abort() {
        let controller = Controller::new();
        controller.abort();

        let start = Instant::now();
        assert!(!controller.sleep(Duration::from_secs(60)).await);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_sleep_is_cut_short_by_concurrent_abort() {
        let controller = Controller::new();
        let handle = controller.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.abort();
        });

        let start = Instant::now();
        assert!(!controller.sleep(Duration::from_secs(60)).await);
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
