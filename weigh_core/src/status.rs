//! Session state and the per-poll status returned to callers.

use crate::error::WeighError;

/// Lifecycle of a capture session. Stability is a property of `Polling`, not a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Polling,
    Captured,
}

/// Outcome of folding one poll result into a session.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureStatus {
    /// Still polling; the window is not stable (or not full enough) yet.
    Unsettled,
    /// Window is stable; waiting for the operator to capture.
    Stable,
    /// Weight committed; polling has stopped.
    Captured(f64),
    /// The last poll failed. Transient errors keep the session polling.
    SourceError(WeighError),
}
