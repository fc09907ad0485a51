//! Progress and ETA for a batch run.
//!
//! Everything here is derived from wall-clock time and counts, recomputed on
//! every iteration. `remaining_time` is an estimate that moves as the total
//! grows; it is never a promise.

use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub start_time: Instant,
    pub current_time: Instant,
    /// Elapsed time divided by `processed`
    pub average_time: Duration,
    /// `(total - processed) * average_time`
    pub remaining_time: Duration,
}

impl Progress {
    /// Progress of a run that has not processed anything yet.
    pub fn started(start_time: Instant) -> Self {
        Self {
            processed: 0,
            total: 0,
            successful: 0,
            failed: 0,
            start_time,
            current_time: start_time,
            average_time: Duration::ZERO,
            remaining_time: Duration::ZERO,
        }
    }

    /// Recompute the derived fields against the current time.
    pub fn compute(
        start_time: Instant,
        processed: usize,
        total: usize,
        successful: usize,
        failed: usize,
    ) -> Self {
        Self::compute_at(Instant::now(), start_time, processed, total, successful, failed)
    }

    pub(crate) fn compute_at(
        now: Instant,
        start_time: Instant,
        processed: usize,
        total: usize,
        successful: usize,
        failed: usize,
    ) -> Self {
        let elapsed = now.saturating_duration_since(start_time);
        let average_time = if processed == 0 {
            Duration::ZERO
        } else {
            elapsed.div_f64(processed as f64)
        };
        let remaining_time = average_time.mul_f64(total.saturating_sub(processed) as f64);

        Self {
            processed,
            total,
            successful,
            failed,
            start_time,
            current_time: now,
            average_time,
            remaining_time,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.current_time.saturating_duration_since(self.start_time)
    }

    /// Share of the total done, in `[0, 100]`. Zero while the total is unknown.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.processed as f64 / self.total as f64 * 100.0).min(100.0)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({:.0}%), {} failed, ETA {}s",
            self.processed,
            self.total,
            self.percent(),
            self.failed,
            self.remaining_time.as_secs()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_and_remaining() {
        let start = Instant::now();
        let now = start + Duration::from_secs(10);

        let progress = Progress::compute_at(now, start, 5, 20, 4, 1);

        assert_eq!(progress.average_time, Duration::from_secs(2));
        assert_eq!(progress.remaining_time, Duration::from_secs(30));
        assert_eq!(progress.elapsed(), Duration::from_secs(10));
        assert_eq!(progress.percent(), 25.0);
    }

    #[test]
    fn test_nothing_processed() {
        let start = Instant::now();
        let progress = Progress::compute_at(start + Duration::from_secs(3), start, 0, 10, 0, 0);

        assert_eq!(progress.average_time, Duration::ZERO);
        assert_eq!(progress.remaining_time, Duration::ZERO);
    }

    #[test]
    fn test_total_smaller_than_processed() {
        // the total can lag behind when items are discovered late
        let start = Instant::now();
        let progress = Progress::compute_at(start + Duration::from_secs(4), start, 4, 2, 4, 0);

        assert_eq!(progress.remaining_time, Duration::ZERO);
        assert_eq!(progress.percent(), 100.0);
    }

    #[test]
    fn test_display() {
        let start = Instant::now();
        let progress = Progress::compute_at(start + Duration::from_secs(10), start, 5, 10, 5, 0);
        assert_eq!(progress.to_string(), "5/10 (50%), 0 failed, ETA 10s");
    }
}
