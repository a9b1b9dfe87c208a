#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core capture logic (device-agnostic).
//!
//! This crate decides when a streamed weight reading has settled and may be
//! committed, and sequences those commits into gross / tare / axle-by-axle
//! results. All device interaction goes through `weigh_traits::ReadingSource`.
//!
//! ## Architecture
//!
//! - **Window**: bounded FIFO of timestamped samples (`window` module)
//! - **Stability**: consecutive-delta check over the window (`stability` module)
//! - **Session**: `Idle -> Polling -> Captured` state machine (`session` module)
//! - **Poller**: single-flight background polling with cancellation (`poller` module)
//! - **Runner**: drives a session to a committed weight (`runner` module)
//! - **Orchestrator**: axle sequencing and completeness (`orchestrator` module)
//! - **Registry**: capture-method keyed source ownership (`registry` module)

// Module declarations
pub mod atomic;
pub mod builder;
pub mod config;
pub mod conversions;
pub mod error;
pub mod mocks;
pub mod orchestrator;
pub mod outcome;
pub mod poller;
pub mod registry;
pub mod runner;
pub mod session;
pub mod source_error;
pub mod stability;
pub mod status;
pub mod window;

pub use builder::{CaptureSessionBuilder, DynCaptureSession, Missing, Set, build_session};
pub use config::{CaptureCfg, Timeouts};
pub use error::{BuildError, Report, Result, WeighError};
pub use orchestrator::{AxleOrchestrator, OrchestratorState, resolve_configuration};
pub use outcome::{AxleWeightRecord, CaptureOutcome, WeighTicket, axle_total};
pub use poller::{PollResult, Poller};
pub use registry::{BoxedSource, CaptureMethod, SourceRegistry};
pub use runner::{
    CaptureTrigger, ManualTrigger, SamplingMode, run_axle_workflow, run_capture,
};
pub use session::{CaptureListener, CaptureSession};
pub use stability::{StabilityDetector, is_stable};
pub use status::{CaptureState, CaptureStatus};
pub use window::{ReadingWindow, Sample};
