//! Progress hooks for report and geocode loops.
//!
//! The driver reports how many units (reports, failures) it will work
//! through and ticks once per unit. The CLI renders this as an `indicatif`
//! bar; tests and library callers pass [`null_progress`].

use std::sync::Arc;

/// Receives progress from a long-running loop.
pub trait ProgressCallback: Send + Sync {
    /// Number of units the loop will process.
    fn set_total(&self, total: u64);

    /// `delta` more units are done.
    fn inc(&self, delta: u64);

    /// Describes the unit in flight, e.g. the report URL.
    fn set_message(&self, msg: String);

    /// The loop is over.
    fn finish(&self, msg: String);
}

/// Discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
