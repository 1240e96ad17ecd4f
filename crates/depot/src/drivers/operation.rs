//! Progress handle passed into long-running driver calls.

/// Caller-owned handle for progress reporting.
///
/// Drivers report through it but are free to ignore cancellation; work
/// already in flight is not aborted.
pub trait Operation: Send + Sync {
    /// Report that `stage` has reached `percent` (0-100).
    fn update_progress(&self, stage: &str, percent: u8);

    /// Whether the caller has asked for the operation to stop.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Operation handle that discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopOperation;

impl Operation for NoopOperation {
    fn update_progress(&self, _stage: &str, _percent: u8) {}
}
