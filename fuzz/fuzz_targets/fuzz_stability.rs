#![no_main]
use libfuzzer_sys::fuzz_target;
use std::time::Instant;
use weigh_core::{ReadingWindow, Sample, StabilityDetector};

fuzz_target!(|input: (u8, u8, f64, Vec<f64>)| {
    let (capacity, min_samples, threshold, values) = input;
    let detector = StabilityDetector::new(threshold, usize::from(min_samples));
    let mut window = ReadingWindow::new(usize::from(capacity));
    let now = Instant::now();
    for v in values {
        window.push(Sample::new(v, now));
        assert!(window.len() <= window.capacity());
        let stable = detector.is_stable(&window);
        // Stability never holds below the sample minimum
        if window.len() < detector.min_samples() {
            assert!(!stable);
        }
    }
});
