//! Proof counters shared by the worker and inline provers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Lock-free proof counters.
#[derive(Debug, Default)]
pub struct ProofMetrics {
    generated: AtomicU64,
    /// Wrong secrets and abandoned attempts included.
    failed: AtomicU64,
    in_flight: AtomicU64,
    proving_nanos: AtomicU64,
}

/// One proof attempt in progress.
///
/// Dropped without an outcome (the caller timed out and abandoned the
/// future), it is counted as a failure.
pub(crate) struct Attempt<'a> {
    metrics: &'a ProofMetrics,
    recorded: bool,
}

impl ProofMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn begin(&self) -> Attempt<'_> {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        Attempt {
            metrics: self,
            recorded: false,
        }
    }

    pub fn generated(&self) -> u64 {
        self.generated.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let generated = self.generated();
        let avg_proving_time = match generated {
            0 => Duration::ZERO,
            n => Duration::from_nanos(self.proving_nanos.load(Ordering::Relaxed) / n),
        };
        MetricsSnapshot {
            generated,
            failed: self.failed(),
            in_flight: self.in_flight(),
            avg_proving_time,
        }
    }
}

impl Attempt<'_> {
    pub(crate) fn succeeded(mut self, proving_time: Duration) {
        self.metrics.generated.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .proving_nanos
            .fetch_add(proving_time.as_nanos() as u64, Ordering::Relaxed);
        self.recorded = true;
    }

    pub(crate) fn failed(mut self) {
        self.metrics.failed.fetch_add(1, Ordering::Relaxed);
        self.recorded = true;
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if !self.recorded {
            self.metrics.failed.fetch_add(1, Ordering::Relaxed);
        }
        self.metrics.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub generated: u64,
    pub failed: u64,
    pub in_flight: u64,
    pub avg_proving_time: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_are_counted_once() {
        let metrics = ProofMetrics::new();
        let first = metrics.begin();
        let second = metrics.begin();
        assert_eq!(metrics.in_flight(), 2);

        first.succeeded(Duration::from_millis(10));
        second.failed();

        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                generated: 1,
                failed: 1,
                in_flight: 0,
                avg_proving_time: Duration::from_millis(10),
            }
        );
    }

    #[test]
    fn abandoned_attempt_counts_as_failure() {
        let metrics = ProofMetrics::new();
        drop(metrics.begin());

        assert_eq!(metrics.failed(), 1);
        assert_eq!(metrics.in_flight(), 0);
        assert_eq!(metrics.snapshot().avg_proving_time, Duration::ZERO);
    }
}
