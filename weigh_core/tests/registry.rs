use std::time::Duration;

use weigh_core::error::WeighError;
use weigh_core::{CaptureMethod, SourceRegistry};
use weigh_hardware::{ManualEntry, ScriptedSource};
use weigh_traits::{ReadingSlot, ReadingSource};

fn live_registry() -> SourceRegistry {
    let mut reg = SourceRegistry::new();
    reg.register(CaptureMethod::Scale, Box::new(ScriptedSource::values([41_000.0])));
    reg.register(CaptureMethod::Manual, Box::new(ManualEntry::new()));
    reg.init();
    reg
}

#[test]
fn select_borrows_the_registered_source() {
    let mut reg = live_registry();
    let src = reg.select(CaptureMethod::Scale).unwrap();
    let w = src.poll(ReadingSlot::Gross, Duration::from_millis(10)).unwrap();
    assert_eq!(w, 41_000.0);
    // Still registered after a borrow
    assert!(reg.contains(CaptureMethod::Scale));
}

#[test]
fn take_moves_the_source_out() {
    let mut reg = live_registry();
    let _src = reg.take(CaptureMethod::Manual).unwrap();
    assert!(!reg.contains(CaptureMethod::Manual));
    assert!(matches!(
        reg.take(CaptureMethod::Manual),
        Err(WeighError::Config(_))
    ));
}

#[test]
fn unknown_method_is_a_config_error() {
    let mut reg = live_registry();
    assert!(matches!(
        reg.select(CaptureMethod::Camera),
        Err(WeighError::Config(msg)) if msg.contains("camera")
    ));
}

#[test]
fn use_before_init_and_after_dispose_is_rejected() {
    let mut reg = SourceRegistry::new();
    reg.register(CaptureMethod::Iot, Box::new(ScriptedSource::values([1.0])));
    assert!(matches!(
        reg.select(CaptureMethod::Iot),
        Err(WeighError::InvalidCaptureRequest(_))
    ));

    reg.init();
    assert!(reg.select(CaptureMethod::Iot).is_ok());
    reg.dispose();
    assert!(!reg.is_initialized());
    assert!(reg.methods().is_empty());
    assert!(reg.select(CaptureMethod::Iot).is_err());
}

#[test]
fn register_replaces_and_lists_methods() {
    let mut reg = live_registry();
    let old = reg.register(CaptureMethod::Scale, Box::new(ScriptedSource::values([2.0])));
    assert!(old.is_some());
    assert_eq!(
        reg.methods(),
        vec![CaptureMethod::Manual, CaptureMethod::Scale]
    );
}
