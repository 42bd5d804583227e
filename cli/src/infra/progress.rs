//! `ProgressReporter` that writes to the tracing subscriber.
//!
//! Used where no terminal is attached, e.g. inside HTTP handlers.

use crate::application::ports::ProgressReporter;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn step(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn success(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }
}
