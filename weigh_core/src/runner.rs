use crate::config::{CaptureCfg, Timeouts};
use crate::error::{Result, WeighError};
use crate::orchestrator::AxleOrchestrator;
use crate::outcome::AxleWeightRecord;
use crate::poller::Poller;
use crate::session::CaptureSession;
use crate::status::CaptureStatus;
use eyre::WrapErr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use weigh_traits::clock::{Clock, MonotonicClock};
use weigh_traits::{AxleConfiguration, ReadingSlot, ReadingSource};

/// How polling should be orchestrated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// The session polls its own source from the caller's thread
    Direct,
    /// A background `Poller` owns the source and feeds the session
    Poller,
}

/// Operator request to commit the latest reading now, stable or not.
///
/// A request stays pending until a weight is committed; the runner calls
/// [`ManualTrigger::committed`] after every successful capture, never after a
/// failed attempt. Plain `Fn() -> bool` closures work as triggers that need no
/// reset.
pub trait ManualTrigger: Send + Sync {
    fn pending(&self) -> bool;

    fn committed(&self) {}
}

impl<F> ManualTrigger for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn pending(&self) -> bool {
        self()
    }
}

pub type CaptureTrigger = Arc<dyn ManualTrigger>;

/// Longest uninterrupted wait, so cancel and the capture trigger stay responsive.
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// Compute the stall warning threshold in milliseconds.
///
/// Four source timeouts, but never less than two poll intervals so a single slow
/// poll doesn't count as a stall.
#[inline]
fn compute_stall_threshold_ms(source_timeout_ms: u64, interval_ms: u64) -> u64 {
    std::cmp::max(
        fast_threshold_ms(source_timeout_ms),
        two_intervals_ms(interval_ms),
    )
    .max(1)
}

#[inline]
fn fast_threshold_ms(source_timeout_ms: u64) -> u64 {
    source_timeout_ms.saturating_mul(4)
}

#[inline]
fn two_intervals_ms(interval_ms: u64) -> u64 {
    interval_ms.saturating_mul(2)
}

#[inline]
fn stalled_now(elapsed_ms: u64, stalled_ms: u64, threshold_ms: u64) -> bool {
    elapsed_ms >= threshold_ms && stalled_ms > threshold_ms
}

#[inline]
fn deadline_passed(elapsed_ms: u64, max_wait_ms: u64) -> bool {
    max_wait_ms > 0 && elapsed_ms >= max_wait_ms
}

fn cancelled(cancel: Option<&Arc<AtomicBool>>) -> bool {
    cancel.is_some_and(|c| c.load(Ordering::Relaxed))
}

/// Sleep up to `d`, returning early once `cancel` is raised.
fn wait_interruptible(clock: &MonotonicClock, d: Duration, cancel: Option<&Arc<AtomicBool>>) {
    let until = clock.now() + d;
    loop {
        if cancelled(cancel) {
            return;
        }
        let left = until.saturating_duration_since(clock.now());
        if left.is_zero() {
            return;
        }
        clock.sleep(left.min(WAIT_SLICE));
    }
}

fn check_guards(
    started: Instant,
    clock: &MonotonicClock,
    timeouts: &Timeouts,
    cancel: Option<&Arc<AtomicBool>>,
) -> std::result::Result<(), WeighError> {
    if cancelled(cancel) {
        return Err(WeighError::Cancelled);
    }
    if deadline_passed(clock.ms_since(started), timeouts.max_wait_ms) {
        return Err(WeighError::Timeout);
    }
    Ok(())
}

/// Honour a pending operator capture request. `None` means keep polling.
fn try_manual_capture<R: ReadingSource>(
    session: &mut CaptureSession<R>,
    trigger: Option<&CaptureTrigger>,
) -> Option<f64> {
    let trigger = trigger?;
    if !trigger.pending() {
        return None;
    }
    match session.capture() {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!(slot = %session.slot(), error = %e, "manual capture not possible yet");
            None
        }
    }
}

/// Poll `slot` until a weight is committed, returning it.
///
/// Stops with `Cancelled` when `cancel` is raised, `Timeout` once
/// `timeouts.max_wait_ms` passes without a capture, and `SourceFailing` when the
/// session escalates repeated source failures.
#[allow(clippy::too_many_arguments)]
pub fn run_capture<R>(
    source: R,
    slot: ReadingSlot,
    capture: CaptureCfg,
    timeouts: Timeouts,
    mode: SamplingMode,
    cancel: Option<Arc<AtomicBool>>,
    capture_trigger: Option<CaptureTrigger>,
) -> Result<f64>
where
    R: ReadingSource + Send + 'static,
{
    let span = tracing::info_span!("capture", %slot, mode = ?mode);
    let _enter = span.enter();
    let result = match mode {
        SamplingMode::Direct => run_direct(
            source,
            slot,
            capture,
            timeouts,
            cancel.as_ref(),
            capture_trigger.as_ref(),
        ),
        SamplingMode::Poller => run_with_poller(
            source,
            slot,
            capture,
            timeouts,
            cancel.as_ref(),
            capture_trigger.as_ref(),
        ),
    };
    if let (Ok(_), Some(trigger)) = (&result, &capture_trigger) {
        trigger.committed();
    }
    result
}

fn run_direct<R>(
    source: R,
    slot: ReadingSlot,
    capture: CaptureCfg,
    timeouts: Timeouts,
    cancel: Option<&Arc<AtomicBool>>,
    capture_trigger: Option<&CaptureTrigger>,
) -> Result<f64>
where
    R: ReadingSource + 'static,
{
    let clock = MonotonicClock::new();
    let interval = capture.poll_interval();
    let mut session = crate::build_session(source, slot, capture, timeouts.clone(), None)?;
    session.start()?;
    tracing::info!(mode = "direct", "capture start");

    let started = clock.now();
    loop {
        check_guards(started, &clock, &timeouts, cancel).map_err(eyre::Report::new)?;
        if let Some(v) = try_manual_capture(&mut session, capture_trigger) {
            return Ok(v);
        }

        let poll_started = clock.now();
        match session.tick()? {
            CaptureStatus::Captured(v) => return Ok(v),
            CaptureStatus::SourceError(e @ WeighError::SourceFailing { .. }) => {
                return Err(eyre::Report::new(e));
            }
            _ => {}
        }
        let spent = clock.now().saturating_duration_since(poll_started);
        wait_interruptible(&clock, interval.saturating_sub(spent), cancel);
    }
}

fn run_with_poller<R>(
    source: R,
    slot: ReadingSlot,
    capture: CaptureCfg,
    timeouts: Timeouts,
    cancel: Option<&Arc<AtomicBool>>,
    capture_trigger: Option<&CaptureTrigger>,
) -> Result<f64>
where
    R: ReadingSource + Send + 'static,
{
    // Use shared NoopSource since ingest() never calls poll()
    use crate::mocks::NoopSource;

    let interval = capture.poll_interval();
    let stall_threshold_ms = compute_stall_threshold_ms(timeouts.source_ms, capture.poll_interval_ms);

    // Build the session first so invalid config never spawns a thread
    let mut session = crate::build_session(NoopSource, slot, capture, timeouts.clone(), None)?;
    session.start()?;

    let mut poller = Poller::spawn(
        source,
        slot,
        interval,
        timeouts.source(),
        MonotonicClock::new(),
    );
    tracing::info!(mode = "poller", "capture start");

    let clock = MonotonicClock::new();
    let started = clock.now();
    let mut stall_reported = false;
    let result = loop {
        if let Err(e) = check_guards(started, &clock, &timeouts, cancel) {
            break Err(eyre::Report::new(e));
        }
        if let Some(v) = try_manual_capture(&mut session, capture_trigger) {
            break Ok(v);
        }

        let stalled_ms = poller.stalled_for_now();
        if stalled_now(clock.ms_since(started), stalled_ms, stall_threshold_ms) {
            if !stall_reported {
                tracing::warn!(stalled_ms, threshold_ms = stall_threshold_ms, "no good reading lately");
                stall_reported = true;
            }
        } else {
            stall_reported = false;
        }

        if let Some(res) = poller.recv_timeout(interval.min(WAIT_SLICE)) {
            match session.ingest(res) {
                CaptureStatus::Captured(v) => break Ok(v),
                CaptureStatus::SourceError(e @ WeighError::SourceFailing { .. }) => {
                    break Err(eyre::Report::new(e));
                }
                _ => {}
            }
        }
    };

    // Stop polling before the session goes away
    poller.stop();
    if poller.overruns() > 0 {
        tracing::debug!(overruns = poller.overruns(), "polls overran their interval");
    }
    result
}

/// Capture every axle of `config` in order, one session at a time, and return the
/// ordered record set.
#[allow(clippy::too_many_arguments)]
pub fn run_axle_workflow<R>(
    source: R,
    config: AxleConfiguration,
    capture: CaptureCfg,
    timeouts: Timeouts,
    mode: SamplingMode,
    cancel: Option<Arc<AtomicBool>>,
    capture_trigger: Option<CaptureTrigger>,
) -> Result<Vec<AxleWeightRecord>>
where
    R: ReadingSource + Send + 'static,
{
    let mut orchestrator = AxleOrchestrator::new(config).map_err(eyre::Report::new)?;
    tracing::info!(
        vehicle = %orchestrator.config().name,
        axles = orchestrator.axle_count(),
        "axle workflow start"
    );
    let shared = Arc::new(Mutex::new(source));
    while !orchestrator.is_completed() {
        let slot = orchestrator.current_slot();
        let weight = run_capture(
            Arc::clone(&shared),
            slot,
            capture.clone(),
            timeouts.clone(),
            mode,
            cancel.clone(),
            capture_trigger.clone(),
        )
        .wrap_err_with(|| format!("capturing {slot}"))?;
        orchestrator
            .on_axle_captured(weight)
            .map_err(eyre::Report::new)?;
    }
    let records = orchestrator.finish().map_err(eyre::Report::new)?;
    tracing::info!(
        total = crate::outcome::axle_total(&records),
        "axle workflow complete"
    );
    Ok(records)
}
