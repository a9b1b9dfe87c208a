//! Capture session: the state machine that turns a stream of readings into one
//! committed weight.
//!
//! ```text
//! Idle --start--> Polling --(stable && auto) or capture()--> Captured
//!   ^                                                            |
//!   +--------------------------- reset ---------------------------+
//! ```
//!
//! The session never sleeps or spawns anything itself. Callers either call
//! [`CaptureSession::tick`] (direct mode, the session polls its own source) or
//! feed results polled elsewhere through [`CaptureSession::ingest`].

use std::sync::Arc;
use std::time::Instant;

use eyre::WrapErr;
use weigh_traits::{Clock, ReadingSlot, ReadingSource};

use crate::config::{CaptureCfg, Timeouts};
use crate::error::{Result, WeighError};
use crate::source_error::map_source_error_dyn;
use crate::stability::StabilityDetector;
use crate::status::{CaptureState, CaptureStatus};
use crate::window::{ReadingWindow, Sample};

pub type CaptureListener = Box<dyn FnMut(f64)>;

pub struct CaptureSession<R: ReadingSource> {
    pub(crate) source: R,
    pub(crate) slot: ReadingSlot,
    pub(crate) cfg: CaptureCfg,
    pub(crate) timeouts: Timeouts,
    pub(crate) detector: StabilityDetector,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) window: ReadingWindow,
    pub(crate) state: CaptureState,
    pub(crate) stable: bool,
    pub(crate) captured_value: Option<f64>,
    pub(crate) last_error: Option<WeighError>,
    pub(crate) consecutive_failures: u32,
    pub(crate) started_at: Option<Instant>,
    pub(crate) on_captured: Option<CaptureListener>,
}

impl<R: ReadingSource> core::fmt::Debug for CaptureSession<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("slot", &self.slot)
            .field("state", &self.state)
            .field("stable", &self.stable)
            .field("captured_value", &self.captured_value)
            .field("window_len", &self.window.len())
            .finish()
    }
}

impl<R: ReadingSource> CaptureSession<R> {
    pub fn slot(&self) -> ReadingSlot {
        self.slot
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_polling(&self) -> bool {
        self.state == CaptureState::Polling
    }

    /// Stability of the current window, as of the last appended sample.
    pub fn is_stable(&self) -> bool {
        self.stable
    }

    pub fn captured_value(&self) -> Option<f64> {
        self.captured_value
    }

    pub fn latest_value(&self) -> Option<f64> {
        self.window.latest().map(|s| s.value)
    }

    pub fn window(&self) -> &ReadingWindow {
        &self.window
    }

    /// Most recent poll failure; cleared by the next good reading.
    pub fn last_error(&self) -> Option<&WeighError> {
        self.last_error.as_ref()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn capture_cfg(&self) -> &CaptureCfg {
        &self.cfg
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Milliseconds since `start()`; 0 when not started.
    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.map_or(0, |t| self.clock.ms_since(t))
    }

    /// Register the listener notified once per Captured transition.
    pub fn set_on_captured<F>(&mut self, f: F)
    where
        F: FnMut(f64) + 'static,
    {
        self.on_captured = Some(Box::new(f));
    }

    /// Idle -> Polling. Starting an already polling session is a no-op.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            CaptureState::Idle => {
                self.state = CaptureState::Polling;
                self.started_at = Some(self.clock.now());
                tracing::debug!(slot = %self.slot, "capture polling");
                Ok(())
            }
            CaptureState::Polling => Ok(()),
            CaptureState::Captured => Err(eyre::Report::new(WeighError::invalid(
                "session already captured; reset before starting again",
            ))),
        }
    }

    /// Any state -> Idle. Clears the window, captured value and error state.
    pub fn reset(&mut self) {
        self.state = CaptureState::Idle;
        self.window.clear();
        self.stable = false;
        self.captured_value = None;
        self.last_error = None;
        self.consecutive_failures = 0;
        self.started_at = None;
        tracing::debug!(slot = %self.slot, "capture reset");
    }

    /// Reset and go straight back to polling.
    pub fn restart(&mut self) -> Result<()> {
        self.reset();
        self.start()
    }

    /// Direct mode: poll the owned source once and fold the result in.
    pub fn tick(&mut self) -> Result<CaptureStatus> {
        if self.state != CaptureState::Polling {
            return Err(eyre::Report::new(WeighError::invalid(
                "tick on a session that is not polling",
            )));
        }
        let timeout = self.timeouts.source();
        let result = self
            .source
            .poll(self.slot, timeout)
            .map_err(|e| map_source_error_dyn(&*e));
        Ok(self.ingest(result))
    }

    /// Fold one poll result into the session.
    ///
    /// Results arriving while not polling are dropped: nothing is appended after
    /// a capture or reset.
    pub fn ingest(&mut self, result: std::result::Result<f64, WeighError>) -> CaptureStatus {
        if self.state != CaptureState::Polling {
            tracing::trace!(slot = %self.slot, state = ?self.state, "dropping late reading");
            return self.status();
        }
        match result {
            Ok(v) if v.is_finite() => self.accept(v),
            Ok(v) => self.reject(WeighError::ReadingUnavailable(format!(
                "non-finite reading {v}"
            ))),
            Err(e) => self.reject(e),
        }
    }

    /// Operator override: commit the latest reading, stable or not.
    pub fn capture(&mut self) -> Result<f64> {
        if self.state != CaptureState::Polling {
            return Err(eyre::Report::new(WeighError::invalid(
                "capture requested while not polling",
            )));
        }
        let value = self
            .latest_value()
            .ok_or_else(|| eyre::Report::new(WeighError::invalid("no reading to capture yet")))
            .wrap_err_with(|| format!("manual capture of {}", self.slot))?;
        if !self.stable {
            tracing::warn!(slot = %self.slot, value, "manual capture of unstable reading");
        }
        self.commit(value);
        Ok(value)
    }

    /// Status implied by the current state without polling.
    pub fn status(&self) -> CaptureStatus {
        match (self.state, self.captured_value) {
            (CaptureState::Captured, Some(v)) => CaptureStatus::Captured(v),
            _ if self.stable => CaptureStatus::Stable,
            _ => CaptureStatus::Unsettled,
        }
    }

    fn accept(&mut self, value: f64) -> CaptureStatus {
        let now = self.clock.now();
        self.window.push(Sample::new(value, now));
        if self.consecutive_failures > 0 {
            tracing::info!(
                slot = %self.slot,
                failures = self.consecutive_failures,
                "reading source recovered"
            );
        }
        self.consecutive_failures = 0;
        self.last_error = None;
        self.stable = self.detector.is_stable(&self.window);
        tracing::debug!(
            slot = %self.slot,
            value,
            stable = self.stable,
            window_len = self.window.len(),
            "reading"
        );
        if self.stable && self.cfg.auto_capture {
            self.commit(value);
            return CaptureStatus::Captured(value);
        }
        if self.stable {
            CaptureStatus::Stable
        } else {
            CaptureStatus::Unsettled
        }
    }

    fn reject(&mut self, err: WeighError) -> CaptureStatus {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(err.clone());
        let limit = self.cfg.max_consecutive_failures;
        if limit > 0 && self.consecutive_failures >= limit {
            tracing::error!(
                slot = %self.slot,
                failures = self.consecutive_failures,
                error = %err,
                "reading source keeps failing"
            );
            return CaptureStatus::SourceError(WeighError::SourceFailing {
                failures: self.consecutive_failures,
            });
        }
        tracing::warn!(slot = %self.slot, error = %err, "reading failed; retrying next poll");
        CaptureStatus::SourceError(err)
    }

    fn commit(&mut self, value: f64) {
        self.state = CaptureState::Captured;
        self.captured_value = Some(value);
        tracing::info!(slot = %self.slot, weight = value, stable = self.stable, "weight captured");
        if let Some(listener) = self.on_captured.as_mut() {
            listener(value);
        }
    }
}
