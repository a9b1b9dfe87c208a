//! Type-state builder for `CaptureSession` and the generic `build_session` constructor.
//!
//! The builder enforces at compile time that a source and a slot are provided
//! before `build()` is available. `try_build()` is always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use weigh_traits::clock::{Clock, MonotonicClock};
use weigh_traits::{ReadingSlot, ReadingSource};

use crate::config::{CaptureCfg, Timeouts};
use crate::error::{BuildError, Result};
use crate::session::{CaptureListener, CaptureSession};
use crate::stability::DEFAULT_MIN_SAMPLES;
use crate::status::CaptureState;
use crate::window::ReadingWindow;

/// Dynamically dispatched session, as produced by the builder.
pub type DynCaptureSession = CaptureSession<Box<dyn ReadingSource>>;

impl DynCaptureSession {
    /// Start building a session.
    pub fn builder() -> CaptureSessionBuilder<Missing, Missing> {
        CaptureSessionBuilder::default()
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

pub struct CaptureSessionBuilder<S, L> {
    source: Option<Box<dyn ReadingSource>>,
    slot: Option<ReadingSlot>,
    capture: Option<CaptureCfg>,
    timeouts: Option<Timeouts>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    on_captured: Option<CaptureListener>,
    _s: PhantomData<S>,
    _l: PhantomData<L>,
}

impl Default for CaptureSessionBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            source: None,
            slot: None,
            capture: None,
            timeouts: None,
            clock: None,
            on_captured: None,
            _s: PhantomData,
            _l: PhantomData,
        }
    }
}

/// Validate configuration and construct a session in the `Idle` state.
///
/// Single source of truth for validation, shared by the builder and `build_session()`.
fn validate_and_build<R: ReadingSource>(
    source: R,
    slot: ReadingSlot,
    capture: CaptureCfg,
    timeouts: Timeouts,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    on_captured: Option<CaptureListener>,
) -> Result<CaptureSession<R>> {
    if capture.window_capacity == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "window_capacity must be >= 1",
        )));
    }
    if capture.min_samples < DEFAULT_MIN_SAMPLES {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "min_samples must be >= 3",
        )));
    }
    if capture.min_samples > capture.window_capacity {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "min_samples must not exceed window_capacity",
        )));
    }
    if !capture.stability_threshold.is_finite() || capture.stability_threshold <= 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "stability_threshold must be finite and > 0",
        )));
    }
    if capture.poll_interval_ms == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "poll_interval_ms must be >= 1",
        )));
    }
    if timeouts.source_ms == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "source_ms must be >= 1",
        )));
    }
    if let ReadingSlot::Axle(0) = slot {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "axle numbers start at 1",
        )));
    }

    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };

    Ok(CaptureSession {
        source,
        slot,
        detector: capture.detector(),
        window: ReadingWindow::new(capture.window_capacity),
        cfg: capture,
        timeouts,
        clock,
        state: CaptureState::Idle,
        stable: false,
        captured_value: None,
        last_error: None,
        consecutive_failures: 0,
        started_at: None,
        on_captured,
    })
}

impl<S, L> CaptureSessionBuilder<S, L> {
    /// Fallible build available in any type-state.
    pub fn try_build(self) -> Result<DynCaptureSession> {
        let source = self
            .source
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSource))?;
        let slot = self
            .slot
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSlot))?;
        validate_and_build(
            source,
            slot,
            self.capture.unwrap_or_default(),
            self.timeouts.unwrap_or_default(),
            self.clock,
            self.on_captured,
        )
    }

    pub fn with_capture(mut self, capture: CaptureCfg) -> Self {
        self.capture = Some(capture);
        self
    }
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = Some(timeouts);
        self
    }
    /// Provide a custom clock; defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
    pub fn on_captured<F>(mut self, f: F) -> Self
    where
        F: FnMut(f64) + 'static,
    {
        self.on_captured = Some(Box::new(f));
        self
    }
}

impl<L> CaptureSessionBuilder<Missing, L> {
    pub fn with_source(
        self,
        source: impl ReadingSource + 'static,
    ) -> CaptureSessionBuilder<Set, L> {
        CaptureSessionBuilder {
            source: Some(Box::new(source)),
            slot: self.slot,
            capture: self.capture,
            timeouts: self.timeouts,
            clock: self.clock,
            on_captured: self.on_captured,
            _s: PhantomData,
            _l: PhantomData,
        }
    }
}

impl<S> CaptureSessionBuilder<S, Missing> {
    pub fn with_slot(self, slot: ReadingSlot) -> CaptureSessionBuilder<S, Set> {
        CaptureSessionBuilder {
            source: self.source,
            slot: Some(slot),
            capture: self.capture,
            timeouts: self.timeouts,
            clock: self.clock,
            on_captured: self.on_captured,
            _s: PhantomData,
            _l: PhantomData,
        }
    }
}

impl CaptureSessionBuilder<Set, Set> {
    /// Validate and build. Only available once source and slot are set.
    pub fn build(self) -> Result<DynCaptureSession> {
        self.try_build()
    }
}

/// Build a statically dispatched session from a concrete source.
///
/// Delegates to the shared `validate_and_build`.
pub fn build_session<R: ReadingSource>(
    source: R,
    slot: ReadingSlot,
    capture: CaptureCfg,
    timeouts: Timeouts,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<CaptureSession<R>> {
    validate_and_build(source, slot, capture, timeouts, clock, None)
}
