//! Boundary traits and types shared by the weighing stack.
//!
//! Anything that talks to the outside world (a scale, an IoT load cell, a camera
//! OCR pipeline, a vehicle registry) is reached through one of the traits here, so
//! `weigh_core` never depends on how a weight is actually produced.
pub mod axle;
pub mod clock;

pub use axle::{AxleConfiguration, AxleType};
pub use clock::{Clock, ManualClock, MonotonicClock};

use serde::{Deserialize, Serialize};

/// Which reading a capture is for. Axle numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "axle", rename_all = "lowercase")]
pub enum ReadingSlot {
    Gross,
    Tare,
    Axle(u32),
}

impl ReadingSlot {
    /// Wire name of the reading kind (`gross`, `tare`, `axle`).
    pub fn kind(&self) -> &'static str {
        match self {
            ReadingSlot::Gross => "gross",
            ReadingSlot::Tare => "tare",
            ReadingSlot::Axle(_) => "axle",
        }
    }

    pub fn axle_number(&self) -> Option<u32> {
        match self {
            ReadingSlot::Axle(n) => Some(*n),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReadingSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadingSlot::Axle(n) => write!(f, "axle {n}"),
            other => f.write_str(other.kind()),
        }
    }
}

/// A weight-producing device.
///
/// `poll` is called repeatedly (about once per second) while a capture is in
/// progress. It returns the current weight for `slot` in the device's weight unit,
/// or an error when no usable value is available right now. Errors are transient
/// from the caller's point of view: the next poll is simply retried.
pub trait ReadingSource {
    fn poll(
        &mut self,
        slot: ReadingSlot,
        timeout: std::time::Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>>;
}

impl<R: ReadingSource + ?Sized> ReadingSource for Box<R> {
    fn poll(
        &mut self,
        slot: ReadingSlot,
        timeout: std::time::Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        (**self).poll(slot, timeout)
    }
}

/// Shared source, e.g. handed to successive pollers in an axle-by-axle run.
impl<R: ReadingSource + ?Sized> ReadingSource for std::sync::Arc<std::sync::Mutex<R>> {
    fn poll(
        &mut self,
        slot: ReadingSlot,
        timeout: std::time::Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        let mut guard = self
            .lock()
            .map_err(|_| "reading source lock poisoned")?;
        guard.poll(slot, timeout)
    }
}

/// Vehicle registry lookup used to size an axle-by-axle capture.
pub trait VehicleLookup {
    fn axle_configuration(
        &self,
        vehicle_id: &str,
    ) -> Result<AxleConfiguration, Box<dyn std::error::Error + Send + Sync>>;
}
