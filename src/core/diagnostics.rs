//! Internal diagnostics for errors the logger swallows
//!
//! A logger cannot log its own failures through itself, so best-effort
//! failures (a batch that could not be written, a rotation copy that failed,
//! a config file that did not parse) are written to stderr with a
//! `[LOGGER ...]` prefix and counted in [`LoggerMetrics`] when one is at hand.

use super::error::LoggerError;
use super::metrics::LoggerMetrics;

/// Report a swallowed error
pub fn report(operation: &str, error: &LoggerError) {
    eprintln!("[LOGGER ERROR] {} failed: {}", operation, error);
}

/// Report a swallowed error and count it
pub fn report_with(metrics: &LoggerMetrics, operation: &str, error: &LoggerError) {
    metrics.record_internal_error();
    report(operation, error);
}

/// Report a non-error condition worth surfacing
pub fn warn(message: impl AsRef<str>) {
    eprintln!("[LOGGER WARNING] {}", message.as_ref());
}
