//! Per-writer metrics for observability
//!
//! Every writer shares one `WriterMetrics` between its handle and its
//! background worker, so callers can watch a backend's health without
//! touching the sink.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Counters and gauges for a single writer
///
/// # Example
///
/// ```
/// use category_logger::WriterMetrics;
///
/// let metrics = WriterMetrics::new();
/// metrics.record_written(12);
/// metrics.record_failed();
///
/// assert_eq!(metrics.written_count(), 1);
/// assert_eq!(metrics.failed_count(), 1);
/// assert_eq!(metrics.current_bytes(), 12);
/// ```
#[derive(Debug)]
pub struct WriterMetrics {
    /// Records handed to the sink successfully
    written: AtomicU64,

    /// Records that could not be delivered
    failed: AtomicU64,

    /// Completed file rotations
    rotations: AtomicU64,

    /// Socket connect attempts, successful or not
    connect_attempts: AtomicU64,

    /// Connects performed because a previous send failed
    reconnects: AtomicU64,

    /// Panics caught at the worker boundary
    panics: AtomicU64,

    /// Lines in the currently open file
    current_lines: AtomicU64,

    /// Bytes in the currently open file
    current_bytes: AtomicU64,

    alive: AtomicBool,
}

impl WriterMetrics {
    pub const fn new() -> Self {
        Self {
            written: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            rotations: AtomicU64::new(0),
            connect_attempts: AtomicU64::new(0),
            reconnects: AtomicU64::new(0),
            panics: AtomicU64::new(0),
            current_lines: AtomicU64::new(0),
            current_bytes: AtomicU64::new(0),
            alive: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn written_count(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rotation_count(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn connect_attempts(&self) -> u64 {
        self.connect_attempts.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn reconnect_count(&self) -> u64 {
        self.reconnects.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn panic_count(&self) -> u64 {
        self.panics.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn current_lines(&self) -> u64 {
        self.current_lines.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn current_bytes(&self) -> u64 {
        self.current_bytes.load(Ordering::Relaxed)
    }

    /// Whether the background worker is still draining its queue
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Record one delivered record of `bytes` length
    #[inline]
    pub fn record_written(&self, bytes: u64) {
        self.written.fetch_add(1, Ordering::Relaxed);
        self.current_lines.fetch_add(1, Ordering::Relaxed);
        self.current_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a rotation and reset the open-file gauges
    #[inline]
    pub fn record_rotation(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
        self.reset_file_gauges(0);
    }

    #[inline]
    pub fn reset_file_gauges(&self, bytes: u64) {
        self.current_lines.store(0, Ordering::Relaxed);
        self.current_bytes.store(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_connect_attempt(&self) {
        self.connect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_panic(&self) {
        self.panics.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::Release);
    }

    /// Calculate the failure rate as a percentage
    pub fn failure_rate(&self) -> f64 {
        let written = self.written_count();
        let failed = self.failed_count();
        let total = written + failed;
        if total == 0 {
            0.0
        } else {
            (failed as f64 / total as f64) * 100.0
        }
    }
}

impl Default for WriterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics() {
        let metrics = WriterMetrics::new();
        assert_eq!(metrics.written_count(), 0);
        assert_eq!(metrics.failed_count(), 0);
        assert_eq!(metrics.rotation_count(), 0);
        assert!(!metrics.is_alive());
    }

    #[test]
    fn test_rotation_resets_gauges() {
        let metrics = WriterMetrics::new();
        metrics.record_written(100);
        metrics.record_written(50);
        assert_eq!(metrics.current_lines(), 2);
        assert_eq!(metrics.current_bytes(), 150);

        metrics.record_rotation();
        assert_eq!(metrics.rotation_count(), 1);
        assert_eq!(metrics.current_lines(), 0);
        assert_eq!(metrics.current_bytes(), 0);
        assert_eq!(metrics.written_count(), 2);
    }

    #[test]
    fn test_failure_rate() {
        let metrics = WriterMetrics::new();
        assert_eq!(metrics.failure_rate(), 0.0);

        for _ in 0..3 {
            metrics.record_written(1);
        }
        metrics.record_failed();
        assert!((metrics.failure_rate() - 25.0).abs() < 0.01);
    }

    #[test]
    fn test_concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let metrics = Arc::new(WriterMetrics::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let m = Arc::clone(&metrics);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    m.record_written(2);
                    m.record_failed();
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(metrics.written_count(), 1000);
        assert_eq!(metrics.failed_count(), 1000);
        assert_eq!(metrics.current_bytes(), 2000);
    }
}
