//! Owned registry of reading sources keyed by capture method.
//!
//! The registry belongs to whatever scope runs the captures (a CLI invocation,
//! a test) and is disposed with it. Sources are borrowed for direct-mode ticks or
//! taken out to move into a `Poller`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use weigh_traits::ReadingSource;

use crate::error::WeighError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMethod {
    Scale,
    Iot,
    Camera,
    Manual,
}

impl CaptureMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureMethod::Scale => "scale",
            CaptureMethod::Iot => "iot",
            CaptureMethod::Camera => "camera",
            CaptureMethod::Manual => "manual",
        }
    }
}

impl std::fmt::Display for CaptureMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type BoxedSource = Box<dyn ReadingSource + Send>;

#[derive(Default)]
pub struct SourceRegistry {
    sources: HashMap<CaptureMethod, BoxedSource>,
    initialized: bool,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the registry live. Registration is accepted before and after.
    pub fn init(&mut self) {
        self.initialized = true;
        tracing::debug!(sources = self.sources.len(), "source registry initialized");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Add or replace the source for `method`; returns the previous one.
    pub fn register(&mut self, method: CaptureMethod, source: BoxedSource) -> Option<BoxedSource> {
        tracing::debug!(%method, "registering reading source");
        self.sources.insert(method, source)
    }

    pub fn contains(&self, method: CaptureMethod) -> bool {
        self.sources.contains_key(&method)
    }

    pub fn methods(&self) -> Vec<CaptureMethod> {
        let mut v: Vec<_> = self.sources.keys().copied().collect();
        v.sort_by_key(|m| m.as_str());
        v
    }

    pub fn select(&mut self, method: CaptureMethod) -> Result<&mut BoxedSource, WeighError> {
        self.ensure_live()?;
        self.sources
            .get_mut(&method)
            .ok_or_else(|| WeighError::Config(format!("no reading source registered for {method}")))
    }

    /// Remove the source for `method`, e.g. to hand it to a poller thread.
    pub fn take(&mut self, method: CaptureMethod) -> Result<BoxedSource, WeighError> {
        self.ensure_live()?;
        self.sources
            .remove(&method)
            .ok_or_else(|| WeighError::Config(format!("no reading source registered for {method}")))
    }

    /// Drop every source and mark the registry unusable until `init()` is called again.
    pub fn dispose(&mut self) {
        let n = self.sources.len();
        self.sources.clear();
        self.initialized = false;
        tracing::debug!(sources = n, "source registry disposed");
    }

    fn ensure_live(&self) -> Result<(), WeighError> {
        if self.initialized {
            Ok(())
        } else {
            Err(WeighError::invalid("source registry used before init()"))
        }
    }
}

impl Drop for SourceRegistry {
    fn drop(&mut self) {
        if self.initialized {
            self.dispose();
        }
    }
}
