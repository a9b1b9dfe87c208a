use std::time::Duration;

use rstest::rstest;
use weigh_hardware::error::SourceError;
use weigh_hardware::{ManualEntry, SimProfile, SimulatedScale};
use weigh_traits::{ReadingSlot, ReadingSource};

const T: Duration = Duration::from_millis(10);

#[rstest]
#[case(ReadingSlot::Gross, 40_000.0)]
#[case(ReadingSlot::Tare, 14_500.0)]
#[case(ReadingSlot::Axle(2), 8_600.0)]
fn simulated_scale_settles_within_jitter(#[case] slot: ReadingSlot, #[case] target: f64) {
    let mut scale = SimulatedScale::default();
    let mut last = 0.0;
    for _ in 0..30 {
        last = scale.poll(slot, T).unwrap();
    }
    // Default jitter is +-2.0; the approach term is negligible after 30 polls
    assert!((last - target).abs() <= 2.0 + 1e-3, "{last} vs {target}");
}

#[rstest]
fn dropouts_are_typed_unavailable_errors() {
    let mut scale = SimulatedScale::new(SimProfile {
        dropout_every: 2,
        ..SimProfile::default()
    });
    assert!(scale.poll(ReadingSlot::Gross, T).is_ok());
    let err = scale.poll(ReadingSlot::Gross, T).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SourceError>(),
        Some(SourceError::Unavailable(_))
    ));
}

#[rstest]
fn manual_entry_is_shared_across_threads() {
    let mut entry = ManualEntry::new();
    let handle = entry.handle();
    assert!(entry.poll(ReadingSlot::Gross, T).is_err());

    std::thread::spawn(move || handle.set(38_250.0)).join().unwrap();
    assert_eq!(entry.poll(ReadingSlot::Gross, T).unwrap(), 38_250.0);
    // Reported on every poll until cleared
    assert_eq!(entry.poll(ReadingSlot::Tare, T).unwrap(), 38_250.0);

    entry.handle().clear();
    let err = entry.poll(ReadingSlot::Gross, T).unwrap_err();
    assert!(err.to_string().contains("no weight entered for gross"));
}
