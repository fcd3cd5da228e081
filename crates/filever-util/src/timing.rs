//! RAII-based timing for measuring and logging operation durations.
//!
//! ```rust,ignore
//! use filever_util::timing::TimingGuard;
//!
//! fn apply(file_id: &str) {
//!     let _timing = TimingGuard::update(file_id);
//!     // ... patch sections ...
//! }
//! ```

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Logs the elapsed time of an operation when dropped.
pub struct TimingGuard {
    /// Kind of operation (e.g. "update", "cleanup").
    operation_type: &'static str,
    /// Subject of the operation, usually a file identifier.
    subject: String,
    start: Instant,
    info_threshold: Duration,
    warn_threshold: Duration,
}

impl TimingGuard {
    /// Create a new timing guard.
    pub fn new(operation_type: &'static str, subject: impl Into<String>) -> Self {
        Self {
            operation_type,
            subject: subject.into(),
            start: Instant::now(),
            info_threshold: Duration::from_millis(20),
            warn_threshold: Duration::from_millis(500),
        }
    }

    /// Timing guard for applying an update to one file.
    pub fn update(file_id: impl Into<String>) -> Self {
        Self::new("update", file_id)
    }

    /// Set the threshold for info-level logging.
    pub fn with_info_threshold(mut self, threshold: Duration) -> Self {
        self.info_threshold = threshold;
        self
    }

    /// Set the threshold for warn-level logging.
    pub fn with_warn_threshold(mut self, threshold: Duration) -> Self {
        self.warn_threshold = threshold;
        self
    }

    /// Elapsed time so far.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let micros = elapsed.as_micros() as u64;

        if elapsed >= self.warn_threshold {
            warn!(
                operation_type = self.operation_type,
                subject = %self.subject,
                duration_us = micros,
                "Slow operation"
            );
        } else if elapsed >= self.info_threshold {
            info!(
                operation_type = self.operation_type,
                subject = %self.subject,
                duration_us = micros,
                "Operation completed"
            );
        } else {
            debug!(
                operation_type = self.operation_type,
                subject = %self.subject,
                duration_us = micros,
                "Operation completed"
            );
        }
    }
}
