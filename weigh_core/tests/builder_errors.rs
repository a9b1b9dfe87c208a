use rstest::rstest;
use weigh_core::error::BuildError;
use weigh_core::{CaptureCfg, CaptureState, DynCaptureSession, Timeouts, build_session};
use weigh_hardware::ScriptedSource;
use weigh_traits::ReadingSlot;

#[rstest]
fn builder_missing_source_yields_typed_build_error() {
    let err = DynCaptureSession::builder()
        // missing with_source()
        .with_slot(ReadingSlot::Gross)
        .try_build()
        .expect_err("should fail with MissingSource");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingSource) => {}
        other => panic!("expected MissingSource, got: {other:?}"),
    }
}

#[rstest]
fn builder_missing_slot_yields_typed_build_error() {
    let err = DynCaptureSession::builder()
        .with_source(ScriptedSource::values([1.0]))
        .try_build()
        .expect_err("should fail with MissingSlot");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingSlot)
    ));
}

#[rstest]
fn builder_builds_idle_session_with_listener() {
    let mut s = DynCaptureSession::builder()
        .with_source(ScriptedSource::values([2.0, 2.0, 2.0]))
        .with_slot(ReadingSlot::Axle(2))
        .with_capture(CaptureCfg {
            poll_interval_ms: 1,
            ..CaptureCfg::default()
        })
        .with_timeouts(Timeouts::default())
        .on_captured(|w| assert_eq!(w, 2.0))
        .build()
        .unwrap();
    assert_eq!(s.state(), CaptureState::Idle);
    assert_eq!(s.slot(), ReadingSlot::Axle(2));
    s.start().unwrap();
    for _ in 0..3 {
        s.tick().unwrap();
    }
    assert_eq!(s.captured_value(), Some(2.0));
}

#[rstest]
#[case(CaptureCfg { window_capacity: 0, ..CaptureCfg::default() }, "window_capacity")]
#[case(CaptureCfg { min_samples: 1, ..CaptureCfg::default() }, "min_samples must be >= 3")]
#[case(CaptureCfg { min_samples: 2, ..CaptureCfg::default() }, "min_samples must be >= 3")]
#[case(CaptureCfg { min_samples: 6, ..CaptureCfg::default() }, "must not exceed window_capacity")]
#[case(CaptureCfg { stability_threshold: 0.0, ..CaptureCfg::default() }, "stability_threshold")]
#[case(CaptureCfg { stability_threshold: f64::NAN, ..CaptureCfg::default() }, "stability_threshold")]
#[case(CaptureCfg { poll_interval_ms: 0, ..CaptureCfg::default() }, "poll_interval_ms")]
fn invalid_capture_config_is_rejected(#[case] capture: CaptureCfg, #[case] needle: &str) {
    let err = build_session(
        ScriptedSource::values([1.0]),
        ReadingSlot::Gross,
        capture,
        Timeouts::default(),
        None,
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(msg)) if msg.contains(needle)
    ));
}

#[rstest]
fn zero_source_timeout_and_axle_zero_are_rejected() {
    let err = build_session(
        ScriptedSource::values([1.0]),
        ReadingSlot::Gross,
        CaptureCfg::default(),
        Timeouts {
            source_ms: 0,
            max_wait_ms: 0,
        },
        None,
    )
    .unwrap_err();
    assert!(err.downcast_ref::<BuildError>().is_some());

    let err = build_session(
        ScriptedSource::values([1.0]),
        ReadingSlot::Axle(0),
        CaptureCfg::default(),
        Timeouts::default(),
        None,
    )
    .unwrap_err();
    assert!(format!("{err}").contains("axle numbers start at 1"));
}
