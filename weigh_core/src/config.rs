//! Runtime configuration for capture sessions.
//!
//! These are the structs the session and runner consume. They are separate from
//! the TOML-deserialized config in `weigh_config`; see `conversions`.

use std::time::Duration;

use crate::stability::{DEFAULT_MIN_SAMPLES, DEFAULT_THRESHOLD, StabilityDetector};
use crate::window::DEFAULT_WINDOW_CAPACITY;

/// Capture behaviour for one session.
#[derive(Debug, Clone)]
pub struct CaptureCfg {
    /// Interval between source polls (ms). Default: 1000.
    pub poll_interval_ms: u64,
    /// Samples kept in the reading window. Default: 5.
    pub window_capacity: usize,
    /// Readings required before stability is judged. Default: 3.
    pub min_samples: usize,
    /// Consecutive readings must differ by less than this. Default: 20.0.
    pub stability_threshold: f64,
    /// Commit the latest reading as soon as the window is stable.
    pub auto_capture: bool,
    /// Escalate after this many failed polls in a row; 0 retries forever.
    pub max_consecutive_failures: u32,
}

impl CaptureCfg {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn detector(&self) -> StabilityDetector {
        StabilityDetector::new(self.stability_threshold, self.min_samples)
    }
}

impl Default for CaptureCfg {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            min_samples: DEFAULT_MIN_SAMPLES,
            stability_threshold: DEFAULT_THRESHOLD,
            auto_capture: true,
            max_consecutive_failures: 0,
        }
    }
}

/// Timeouts and deadlines.
#[derive(Debug, Clone)]
pub struct Timeouts {
    /// Max wait per source poll (ms).
    pub source_ms: u64,
    /// Give up a capture after this long without committing (ms); 0 waits forever.
    pub max_wait_ms: u64,
}

impl Timeouts {
    pub fn source(&self) -> Duration {
        Duration::from_millis(self.source_ms)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            source_ms: 800,
            max_wait_ms: 0,
        }
    }
}
