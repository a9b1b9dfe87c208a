//! `From` implementations bridging `weigh_config` types to `weigh_core` types.

use crate::config::{CaptureCfg, Timeouts};
use crate::registry::CaptureMethod;
use crate::runner::SamplingMode;

// ── CaptureCfg ───────────────────────────────────────────────────────────────

impl From<&weigh_config::CaptureCfg> for CaptureCfg {
    fn from(c: &weigh_config::CaptureCfg) -> Self {
        Self {
            poll_interval_ms: c.poll_interval_ms,
            window_capacity: c.window_capacity,
            min_samples: c.min_samples,
            stability_threshold: c.stability_threshold,
            auto_capture: c.auto_capture,
            max_consecutive_failures: c.max_consecutive_failures,
        }
    }
}

// ── Timeouts ─────────────────────────────────────────────────────────────────

// The capture deadline lives under [capture] in the file
impl From<&weigh_config::Config> for Timeouts {
    fn from(c: &weigh_config::Config) -> Self {
        Self {
            source_ms: c.timeouts.source_ms,
            max_wait_ms: c.capture.max_wait_ms,
        }
    }
}

// ── Modes ────────────────────────────────────────────────────────────────────

impl From<weigh_config::RunMode> for SamplingMode {
    fn from(m: weigh_config::RunMode) -> Self {
        match m {
            weigh_config::RunMode::Poller => SamplingMode::Poller,
            weigh_config::RunMode::Direct => SamplingMode::Direct,
        }
    }
}

impl From<weigh_config::Method> for CaptureMethod {
    fn from(m: weigh_config::Method) -> Self {
        match m {
            weigh_config::Method::Scale => CaptureMethod::Scale,
            weigh_config::Method::Iot => CaptureMethod::Iot,
            weigh_config::Method::Camera => CaptureMethod::Camera,
            weigh_config::Method::Manual => CaptureMethod::Manual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_maps_onto_core_types() {
        let cfg = weigh_config::load_toml(
            "[capture]\nmin_samples = 4\nmax_wait_ms = 9000\n[timeouts]\nsource_ms = 300\n[runner]\nmode = \"direct\"\n[source]\nmethod = \"camera\"\n",
        )
        .unwrap();
        let capture = CaptureCfg::from(&cfg.capture);
        assert_eq!(capture.min_samples, 4);
        assert_eq!(capture.window_capacity, 5);
        let timeouts = Timeouts::from(&cfg);
        assert_eq!(timeouts.source_ms, 300);
        assert_eq!(timeouts.max_wait_ms, 9000);
        assert_eq!(SamplingMode::from(cfg.runner.mode), SamplingMode::Direct);
        assert_eq!(CaptureMethod::from(cfg.source.method), CaptureMethod::Camera);
    }
}
