use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Receives the fixed percentage checkpoints the driver emits between
/// passes. Reporting must not influence reconciliation output.
pub trait ProgressSink {
    fn report(&mut self, percent: u8);
}

/// Collects reported percentages; handy in tests and for buffered UIs.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub reported: Vec<u8>,
}

impl ProgressSink for CollectingSink {
    fn report(&mut self, percent: u8) {
        self.reported.push(percent);
    }
}

/// Caller-driven cancellation flag, polled between passes. Cloning shares
/// the flag, so one handle can cancel a reconciliation running elsewhere.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Optional hooks for a single reconciliation run.
#[derive(Default)]
pub struct RunOptions<'a> {
    pub progress: Option<&'a mut dyn ProgressSink>,
    pub cancel: Option<&'a CancelToken>,
}
