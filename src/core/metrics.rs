//! Logger metrics for observability
//!
//! Counters for the queue, the writer thread, rotations and config reloads.
//! Every counter is a relaxed atomic; values are advisory.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use multiprocess_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_queued();
/// metrics.record_batch(1);
///
/// assert_eq!(metrics.lines_queued(), 1);
/// assert_eq!(metrics.lines_written(), 1);
/// assert_eq!(metrics.pending(), 0);
/// ```
#[derive(Debug, Default)]
pub struct LoggerMetrics {
    /// Lines handed to the writer thread
    lines_queued: AtomicU64,

    /// Lines the writer thread passed to the file appender
    lines_written: AtomicU64,

    /// Appender writes (one per drained batch)
    batches_written: AtomicU64,

    /// Largest batch drained in one wake cycle
    max_batch: AtomicU64,

    /// Rolling operations performed by the appender
    rotations: AtomicU64,

    /// Batches lost to I/O failures
    write_failures: AtomicU64,

    /// Setup reloads triggered by the config watcher or explicitly
    reloads: AtomicU64,

    /// Errors reported through diagnostics
    internal_errors: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            lines_queued: AtomicU64::new(0),
            lines_written: AtomicU64::new(0),
            batches_written: AtomicU64::new(0),
            max_batch: AtomicU64::new(0),
            rotations: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            reloads: AtomicU64::new(0),
            internal_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn lines_queued(&self) -> u64 {
        self.lines_queued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn lines_written(&self) -> u64 {
        self.lines_written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn batches_written(&self) -> u64 {
        self.batches_written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn max_batch(&self) -> u64 {
        self.max_batch.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn reloads(&self) -> u64 {
        self.reloads.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn internal_errors(&self) -> u64 {
        self.internal_errors.load(Ordering::Relaxed)
    }

    /// Lines queued but not yet handed to the appender
    pub fn pending(&self) -> u64 {
        self.lines_queued().saturating_sub(self.lines_written())
    }

    #[inline]
    pub fn record_queued(&self) -> u64 {
        self.lines_queued.fetch_add(1, Ordering::Relaxed)
    }

    /// Record one drained batch of `lines` lines
    pub fn record_batch(&self, lines: usize) {
        let lines = lines as u64;
        self.lines_written.fetch_add(lines, Ordering::Relaxed);
        self.batches_written.fetch_add(1, Ordering::Relaxed);
        self.max_batch.fetch_max(lines, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rotation(&self) -> u64 {
        self.rotations.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_write_failure(&self) -> u64 {
        self.write_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_reload(&self) -> u64 {
        self.reloads.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_internal_error(&self) -> u64 {
        self.internal_errors.fetch_add(1, Ordering::Relaxed)
    }

    /// Average lines per appender write, 0.0 before the first batch
    pub fn average_batch(&self) -> f64 {
        let batches = self.batches_written();
        if batches == 0 {
            return 0.0;
        }
        self.lines_written() as f64 / batches as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_accounting() {
        let metrics = LoggerMetrics::new();
        for _ in 0..10 {
            metrics.record_queued();
        }
        metrics.record_batch(3);
        metrics.record_batch(5);

        assert_eq!(metrics.lines_written(), 8);
        assert_eq!(metrics.batches_written(), 2);
        assert_eq!(metrics.max_batch(), 5);
        assert_eq!(metrics.pending(), 2);
        assert!((metrics.average_batch() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_average_without_batches() {
        assert_eq!(LoggerMetrics::new().average_batch(), 0.0);
    }
}
