//! Cooperative cancellation and progress primitives shared between an analysis
//! and the computations it wraps.

use std::sync::{
    atomic::{AtomicBool, AtomicU8, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

/// Sleep increment used while padding a run to its minimum working time.
pub const PADDING_STEP: Duration = Duration::from_millis(10);

/// A long-running operation that can be interrupted from another thread.
pub trait Interruptible {
    fn progress(&self) -> u8;

    /// Makes the operation stop within a bounded number of internal steps.
    fn interrupt(&self);
}

/// Shared stop flag polled by running computations.
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    stopped: Arc<AtomicBool>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Percent counter written by the worker and read by the interactive thread.
#[derive(Debug, Clone, Default)]
pub struct ProgressCounter {
    percent: Arc<AtomicU8>,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> u8 {
        self.percent.load(Ordering::Relaxed)
    }

    /// Stores `percent` (clamped to 100). Never moves the counter backwards.
    pub fn advance(&self, percent: u8) {
        self.percent.fetch_max(percent.min(100), Ordering::Relaxed);
    }

    /// Stores `done / total` as a percentage.
    pub fn advance_fraction(&self, done: u64, total: u64) {
        if total == 0 {
            self.advance(100);
            return;
        }
        let percent = (done.min(total) * 100) / total;
        self.advance(percent as u8);
    }
}

/// Sleeps until `started + minimum` has passed or `stop` is raised.
///
/// Returns `false` when the wait was cut short by the stop flag.
pub fn pad_to_minimum(started: Instant, minimum: Duration, stop: &StopFlag) -> bool {
    while started.elapsed() < minimum {
        if stop.is_stopped() {
            return false;
        }
        let remaining = minimum.saturating_sub(started.elapsed());
        std::thread::sleep(remaining.min(PADDING_STEP));
    }
    !stop.is_stopped()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn progress_never_moves_backwards() {
        let progress = ProgressCounter::new();
        progress.advance(40);
        progress.advance(10);
        assert_eq!(progress.get(), 40);
        progress.advance(250);
        assert_eq!(progress.get(), 100);
    }

    #[test]
    fn empty_work_counts_as_complete() {
        let progress = ProgressCounter::new();
        progress.advance_fraction(0, 0);
        assert_eq!(progress.get(), 100);
    }

    #[test]
    fn padding_waits_for_minimum_working_time() {
        let stop = StopFlag::new();
        let started = Instant::now();
        assert!(pad_to_minimum(started, Duration::from_millis(60), &stop));
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn padding_returns_early_once_stopped() {
        let stop = StopFlag::new();
        let remote = stop.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            remote.stop();
        });

        let started = Instant::now();
        assert!(!pad_to_minimum(started, Duration::from_secs(10), &stop));
        assert!(started.elapsed() < Duration::from_secs(2));
        handle.join().unwrap();
    }

    proptest! {
        #[test]
        fn fractional_progress_stays_in_range(done in 0u64..10_000, total in 0u64..10_000) {
            let progress = ProgressCounter::new();
            progress.advance_fraction(done, total);
            prop_assert!(progress.get() <= 100);
        }
    }
}
