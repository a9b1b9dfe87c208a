//! Source assembly from config, and the capture / axles / ticket commands.

use crate::cli::CaptureOpts;
use eyre::WrapErr;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use weigh_config::{Config, Driver, FleetCsv};
use weigh_core::error::Result as CoreResult;
use weigh_core::{
    BoxedSource, CaptureCfg, CaptureMethod, CaptureOutcome, CaptureTrigger, ManualTrigger, Report,
    SamplingMode, SourceRegistry, Timeouts, WeighError, WeighTicket, resolve_configuration,
    run_axle_workflow, run_capture,
};
use weigh_hardware::{ManualEntry, SimProfile, SimulatedScale};
use weigh_traits::{AxleConfiguration, ReadingSlot, ReadingSource};

/// Effective per-run capture settings after CLI overrides.
struct Plan {
    capture: CaptureCfg,
    timeouts: Timeouts,
    mode: SamplingMode,
    trigger: Option<CaptureTrigger>,
}

impl Plan {
    fn new(cfg: &Config, opts: &CaptureOpts) -> Self {
        let mut timeouts = Timeouts::from(cfg);
        if let Some(ms) = opts.max_wait_ms {
            timeouts.max_wait_ms = ms;
        }
        let mode = if opts.direct {
            SamplingMode::Direct
        } else {
            SamplingMode::from(cfg.runner.mode)
        };
        Self {
            capture: CaptureCfg::from(&cfg.capture),
            timeouts,
            mode,
            trigger: opts
                .capture_after_ms
                .map(|ms| Arc::new(DelayTrigger::new(ms)) as CaptureTrigger),
        }
    }
}

/// Pending once `after` has passed since it was armed, and stays pending until a
/// weight is committed. Each commit re-arms it, so every axle of a multi-capture
/// run gets its own window.
struct DelayTrigger {
    after: Duration,
    armed: Mutex<Instant>,
}

impl DelayTrigger {
    fn new(ms: u64) -> Self {
        Self {
            after: Duration::from_millis(ms),
            armed: Mutex::new(Instant::now()),
        }
    }
}

impl ManualTrigger for DelayTrigger {
    fn pending(&self) -> bool {
        self.armed
            .lock()
            .is_ok_and(|at| at.elapsed() >= self.after)
    }

    fn committed(&self) {
        if let Ok(mut at) = self.armed.lock() {
            *at = Instant::now();
        }
    }
}

fn env_override<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn sim_profile(cfg: &Config) -> SimProfile {
    let s = &cfg.source;
    let mut p = SimProfile {
        jitter: s.sim_jitter,
        dropout_every: s.sim_dropout_every,
        seed: s.seed,
        ..SimProfile::default()
    };
    if let Some(g) = s.sim_gross {
        p.gross = g;
    }
    if let Some(t) = s.sim_tare {
        p.tare = t;
    }
    if !s.sim_axles.is_empty() {
        p.axles.clone_from(&s.sim_axles);
    }
    // Test hooks
    if let Some(j) = env_override::<f64>("WEIGH_TEST_SIM_JITTER") {
        p.jitter = j;
    }
    if let Some(n) = env_override::<u32>("WEIGH_TEST_SIM_DROPOUT") {
        p.dropout_every = n;
    }
    p
}

#[cfg(feature = "http")]
fn http_source(cfg: &Config) -> CoreResult<BoxedSource> {
    let base_url = cfg.source.base_url.as_deref().unwrap_or_default();
    let device_id = cfg.source.device_id.as_deref().unwrap_or_default();
    let source = weigh_hardware::HttpSource::new(base_url, device_id)
        .wrap_err("init http reading source")?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "http"))]
fn http_source(_cfg: &Config) -> CoreResult<BoxedSource> {
    eyre::bail!("source.driver = \"http\" needs a build with the `http` feature")
}

/// Register the configured source (or a manual entry holding `manual_weight`)
/// and return the method to capture with.
pub fn build_registry(
    cfg: &Config,
    manual_weight: Option<f64>,
) -> CoreResult<(SourceRegistry, CaptureMethod)> {
    let mut registry = SourceRegistry::new();
    registry.init();

    if let Some(w) = manual_weight {
        if !(w.is_finite() && w >= 0.0) {
            return Err(Report::new(WeighError::InvalidCaptureRequest(format!(
                "entered weight {w} must be finite and >= 0"
            ))));
        }
        let entry = ManualEntry::new();
        entry.handle().set(w);
        registry.register(CaptureMethod::Manual, Box::new(entry));
        return Ok((registry, CaptureMethod::Manual));
    }

    let method = CaptureMethod::from(cfg.source.method);
    let source: BoxedSource = match (method, cfg.source.driver) {
        (CaptureMethod::Manual, _) => {
            return Err(Report::new(WeighError::InvalidCaptureRequest(
                "source.method = \"manual\" needs a weight entered with --weight".into(),
            )));
        }
        (_, Driver::Sim) => Box::new(SimulatedScale::new(sim_profile(cfg))),
        (_, Driver::Http) => http_source(cfg)?,
    };
    tracing::debug!(%method, driver = ?cfg.source.driver, "reading source registered");
    registry.register(method, source);
    Ok((registry, method))
}

fn take_source(cfg: &Config, manual_weight: Option<f64>) -> CoreResult<BoxedSource> {
    let (mut registry, method) = build_registry(cfg, manual_weight)?;
    registry.take(method).map_err(Report::new)
}

/// Capture one gross or tare weight.
pub fn run_single(
    cfg: &Config,
    slot: ReadingSlot,
    manual_weight: Option<f64>,
    opts: &CaptureOpts,
    cancel: Arc<AtomicBool>,
) -> CoreResult<CaptureOutcome> {
    let source = take_source(cfg, manual_weight)?;
    let plan = Plan::new(cfg, opts);
    let weight = run_capture(
        source,
        slot,
        plan.capture,
        plan.timeouts,
        plan.mode,
        Some(cancel),
        plan.trigger,
    )?;
    Ok(CaptureOutcome::single(slot, weight))
}

/// Pick the axle layout: fleet or `[vehicle]` lookup by id, else the configured
/// vehicle, else the default layout.
pub fn axle_configuration(
    cfg: &Config,
    fleet: Option<&FleetCsv>,
    vehicle_id: Option<&str>,
) -> AxleConfiguration {
    match (vehicle_id, fleet, cfg.vehicle.as_ref()) {
        (Some(id), Some(fleet), _) => resolve_configuration(fleet, id),
        (Some(id), None, Some(v)) => resolve_configuration(v, id),
        (None, _, Some(v)) => v.to_axle_configuration(),
        (Some(id), None, None) => {
            tracing::warn!(vehicle = id, "no fleet or [vehicle] to look up; using default axle configuration");
            AxleConfiguration::default()
        }
        (None, _, None) => AxleConfiguration::default(),
    }
}

/// Capture every axle of the selected vehicle.
pub fn run_axles(
    cfg: &Config,
    fleet: Option<&FleetCsv>,
    vehicle_id: Option<&str>,
    opts: &CaptureOpts,
    cancel: Arc<AtomicBool>,
) -> CoreResult<CaptureOutcome> {
    let config = axle_configuration(cfg, fleet, vehicle_id);
    let source = take_source(cfg, None)?;
    let plan = Plan::new(cfg, opts);
    let records = run_axle_workflow(
        source,
        config,
        plan.capture,
        plan.timeouts,
        plan.mode,
        Some(cancel),
        plan.trigger,
    )?;
    Ok(CaptureOutcome::axles(records))
}

/// Capture gross then tare from the same source and compute the net.
pub fn run_ticket(
    cfg: &Config,
    opts: &CaptureOpts,
    cancel: &Arc<AtomicBool>,
) -> CoreResult<WeighTicket> {
    let shared = Arc::new(Mutex::new(take_source(cfg, None)?));
    let plan = Plan::new(cfg, opts);
    let mut weights = [0.0_f64; 2];
    for (slot, out) in [ReadingSlot::Gross, ReadingSlot::Tare]
        .into_iter()
        .zip(weights.iter_mut())
    {
        *out = run_capture(
            Arc::clone(&shared),
            slot,
            plan.capture.clone(),
            plan.timeouts.clone(),
            plan.mode,
            Some(Arc::clone(cancel)),
            plan.trigger.clone(),
        )
        .wrap_err_with(|| format!("capturing {slot}"))?;
    }
    let [gross, tare] = weights;
    let ticket = WeighTicket::new(gross, tare)
        .map_err(Report::new)?
        .with_gross_limit(cfg.vehicle.as_ref().and_then(|v| v.max_gross));
    if ticket.overloaded == Some(true) {
        tracing::warn!(gross = ticket.gross, "gross exceeds vehicle limit");
    }
    Ok(ticket)
}

/// Poll the configured source once. Manual entry has nothing to probe.
pub fn self_check(cfg: &Config) -> CoreResult<String> {
    if cfg.source.method == weigh_config::Method::Manual {
        return Ok("manual entry configured; no device to probe".to_string());
    }
    let mut source = take_source(cfg, None)?;
    let timeouts = Timeouts::from(cfg);
    let value = source
        .poll(ReadingSlot::Gross, timeouts.source())
        .map_err(|e| eyre::eyre!("reading source did not answer: {e}"))?;
    Ok(format!(
        "{} source answered with {value:.1}",
        CaptureMethod::from(cfg.source.method)
    ))
}
