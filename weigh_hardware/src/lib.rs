#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Concrete reading sources: simulated scale, scripted replay, manual entry and,
//! with the `http` feature, a networked scale gateway.
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod manual;
pub mod scripted;
pub mod sim;

#[cfg(feature = "http")]
pub use http::HttpSource;
pub use manual::{ManualEntry, ManualEntryHandle};
pub use scripted::{ScriptedSource, Step};
pub use sim::{SimProfile, SimulatedScale};
