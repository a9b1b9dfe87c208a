//! Settle detection over a reading window.
//!
//! A window is stable when it holds at least `min_samples` readings and every
//! consecutive pair differs by strictly less than `threshold`. Only deltas
//! matter, never absolute magnitude. One outlier anywhere in the window keeps it
//! unstable until the outlier has been evicted, so a spike delays capture by up
//! to `capacity` polls.

use std::cmp::Ordering;

use crate::window::ReadingWindow;

/// Default maximum delta between consecutive readings, in weight units.
pub const DEFAULT_THRESHOLD: f64 = 20.0;
/// Never judge stability on fewer readings than this.
pub const DEFAULT_MIN_SAMPLES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityDetector {
    threshold: f64,
    min_samples: usize,
}

impl StabilityDetector {
    /// `min_samples` is clamped to at least [`DEFAULT_MIN_SAMPLES`]; only the
    /// threshold may go below the default.
    pub fn new(threshold: f64, min_samples: usize) -> Self {
        Self {
            threshold,
            min_samples: min_samples.max(DEFAULT_MIN_SAMPLES),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    pub fn is_stable(&self, window: &ReadingWindow) -> bool {
        if window.len() < self.min_samples {
            return false;
        }
        deltas_within(window.values(), self.threshold)
    }
}

impl Default for StabilityDetector {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, DEFAULT_MIN_SAMPLES)
    }
}

/// Stability check with the default minimum sample count.
pub fn is_stable(window: &ReadingWindow, threshold: f64) -> bool {
    StabilityDetector::new(threshold, DEFAULT_MIN_SAMPLES).is_stable(window)
}

/// True when every consecutive delta is `< threshold`. NaN anywhere fails.
fn deltas_within(values: impl Iterator<Item = f64>, threshold: f64) -> bool {
    let mut prev: Option<f64> = None;
    for v in values {
        if let Some(p) = prev
            && (v - p).abs().partial_cmp(&threshold) != Some(Ordering::Less)
        {
            return false;
        }
        prev = Some(v);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::Sample;
    use std::time::Instant;

    fn window(values: &[f64]) -> ReadingWindow {
        let mut w = ReadingWindow::new(5);
        let t = Instant::now();
        for v in values {
            w.push(Sample::new(*v, t));
        }
        w
    }

    #[test]
    fn delta_equal_to_threshold_is_unstable() {
        assert!(!is_stable(&window(&[100.0, 120.0, 121.0]), 20.0));
        assert!(is_stable(&window(&[100.0, 119.99, 121.0]), 20.0));
    }

    #[test]
    fn nan_is_never_stable() {
        assert!(!is_stable(&window(&[100.0, f64::NAN, 100.0]), 20.0));
    }

    #[test]
    fn min_samples_is_at_least_three() {
        for asked in [0, 1, 2] {
            let d = StabilityDetector::new(20.0, asked);
            assert_eq!(d.min_samples(), DEFAULT_MIN_SAMPLES);
            assert!(!d.is_stable(&window(&[40000.0, 40005.0])));
            assert!(d.is_stable(&window(&[40000.0, 40005.0, 40003.0])));
        }
    }
}
