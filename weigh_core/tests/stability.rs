//! Stability is decided by consecutive deltas alone.
use std::time::Instant;

use proptest::prelude::*;
use rstest::rstest;
use weigh_core::stability::{DEFAULT_THRESHOLD, StabilityDetector, is_stable};
use weigh_core::window::{ReadingWindow, Sample};

fn window_of(values: &[f64], capacity: usize) -> ReadingWindow {
    let now = Instant::now();
    let mut w = ReadingWindow::new(capacity);
    for &v in values {
        w.push(Sample::new(v, now));
    }
    w
}

/// Stability after each successive push.
fn stability_trace(values: &[f64]) -> Vec<bool> {
    let now = Instant::now();
    let mut w = ReadingWindow::new(5);
    values
        .iter()
        .map(|&v| {
            w.push(Sample::new(v, now));
            is_stable(&w, DEFAULT_THRESHOLD)
        })
        .collect()
}

#[rstest]
fn settles_from_third_sample() {
    let trace = stability_trace(&[40000.0, 40010.0, 40005.0, 40008.0, 40009.0]);
    assert_eq!(trace, vec![false, false, true, true, true]);
}

#[rstest]
fn spike_keeps_window_unstable() {
    let trace = stability_trace(&[40000.0, 40500.0, 40010.0, 40008.0]);
    assert!(trace.iter().all(|s| !s));
}

#[rstest]
fn spike_clears_once_evicted() {
    // Capacity 5: the 40500 spike leaves with the 7th push
    let trace = stability_trace(&[
        40000.0, 40500.0, 40010.0, 40008.0, 40009.0, 40011.0, 40010.0,
    ]);
    assert_eq!(trace, vec![false, false, false, false, false, false, true]);
}

#[rstest]
#[case(&[100.0, 100.0], false)] // too few samples
#[case(&[100.0, 100.0, 100.0], true)]
#[case(&[100.0, 119.999, 100.0], true)]
#[case(&[100.0, 120.0, 100.0], false)] // delta equal to threshold is not stable
#[case(&[100.0, 80.0, 60.0], false)]
#[case(&[0.0, -5.0, -10.0], true)]
#[case(&[100.0, f64::NAN, 100.0], false)]
fn default_threshold_cases(#[case] values: &[f64], #[case] stable: bool) {
    assert_eq!(is_stable(&window_of(values, 5), DEFAULT_THRESHOLD), stable);
}

#[rstest]
fn custom_detector_threshold_and_min_samples() {
    let det = StabilityDetector::new(5.0, 4);
    let w = window_of(&[10.0, 12.0, 14.0], 5);
    assert!(!det.is_stable(&w), "only 3 of 4 required samples");
    let w = window_of(&[10.0, 12.0, 14.0, 16.0], 5);
    assert!(det.is_stable(&w));
    let w = window_of(&[10.0, 12.0, 14.0, 19.0], 5);
    assert!(!det.is_stable(&w));
}

proptest! {
    // Integer-valued readings keep every delta exact in f64
    #[test]
    fn stability_depends_only_on_deltas(
        base in -1_000_000_000i64..1_000_000_000i64,
        offset in -1_000_000i64..1_000_000i64,
        deltas in prop::collection::vec(-60i32..60i32, 2..5),
    ) {
        let mut values = vec![base as f64];
        for d in &deltas {
            let last = *values.last().unwrap();
            values.push(last + f64::from(*d));
        }
        let expected = deltas.iter().all(|d| d.abs() < 20);

        let w = window_of(&values, 5);
        prop_assert_eq!(is_stable(&w, DEFAULT_THRESHOLD), expected);

        let shifted: Vec<f64> = values.iter().map(|v| v + offset as f64).collect();
        let ws = window_of(&shifted, 5);
        prop_assert_eq!(is_stable(&ws, DEFAULT_THRESHOLD), expected);
    }

    #[test]
    fn fewer_than_min_samples_is_never_stable(v in -1e6f64..1e6f64, n in 0usize..3) {
        let values = vec![v; n];
        prop_assert!(!is_stable(&window_of(&values, 5), DEFAULT_THRESHOLD));
    }
}
