//! Operator-typed weights.
//!
//! The operator (or a UI thread) writes the current value through a
//! [`ManualEntryHandle`]; the source reports it on every poll until cleared.
use std::sync::{Arc, Mutex};

use weigh_traits::{ReadingSlot, ReadingSource};

use crate::error::SourceError;

#[derive(Debug, Clone, Default)]
pub struct ManualEntryHandle {
    value: Arc<Mutex<Option<f64>>>,
}

impl ManualEntryHandle {
    pub fn set(&self, weight: f64) {
        if let Ok(mut v) = self.value.lock() {
            *v = Some(weight);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut v) = self.value.lock() {
            *v = None;
        }
    }

    fn get(&self) -> Option<f64> {
        self.value.lock().ok().and_then(|v| *v)
    }
}

#[derive(Debug, Default)]
pub struct ManualEntry {
    handle: ManualEntryHandle,
}

impl ManualEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> ManualEntryHandle {
        self.handle.clone()
    }
}

impl ReadingSource for ManualEntry {
    fn poll(
        &mut self,
        slot: ReadingSlot,
        _timeout: std::time::Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        match self.handle.get() {
            Some(v) if v.is_finite() => Ok(v),
            Some(v) => Err(Box::new(SourceError::Parse(format!("non-finite entry {v}")))),
            None => Err(Box::new(SourceError::Unavailable(format!(
                "no weight entered for {slot}"
            )))),
        }
    }
}
