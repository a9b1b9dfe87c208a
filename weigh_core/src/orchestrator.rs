//! Axle-by-axle capture sequencing.
//!
//! The orchestrator only sees committed weights. It never touches a session's
//! window; whoever drives the sessions reports each capture through
//! [`AxleOrchestrator::on_axle_captured`].

use std::collections::BTreeMap;

use weigh_traits::{AxleConfiguration, AxleType, ReadingSlot, VehicleLookup};

use crate::error::WeighError;
use crate::outcome::AxleWeightRecord;

/// Look up the axle configuration for `vehicle_id`, falling back to the default
/// 5-axle configuration when the lookup fails. Never fatal.
pub fn resolve_configuration(lookup: &dyn VehicleLookup, vehicle_id: &str) -> AxleConfiguration {
    match lookup.axle_configuration(vehicle_id) {
        Ok(cfg) if cfg.axle_count > 0 => cfg,
        Ok(_) => {
            tracing::warn!(vehicle_id, "vehicle has no axles configured; using default");
            AxleConfiguration::default()
        }
        Err(e) => {
            let err = WeighError::ConfigurationUnavailable(e.to_string());
            tracing::warn!(vehicle_id, error = %err, "using default axle configuration");
            AxleConfiguration::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    InProgress,
    Completed,
}

#[derive(Debug, Clone)]
pub struct AxleOrchestrator {
    config: AxleConfiguration,
    current: u32,
    // Keyed by axle number: at most one record per axle
    records: BTreeMap<u32, AxleWeightRecord>,
    state: OrchestratorState,
}

impl AxleOrchestrator {
    pub fn new(config: AxleConfiguration) -> Result<Self, WeighError> {
        if config.axle_count == 0 {
            return Err(WeighError::Config("axle_count must be >= 1".into()));
        }
        Ok(Self {
            config,
            current: 1,
            records: BTreeMap::new(),
            state: OrchestratorState::InProgress,
        })
    }

    pub fn config(&self) -> &AxleConfiguration {
        &self.config
    }

    pub fn axle_count(&self) -> u32 {
        self.config.axle_count
    }

    /// 1-based axle currently being captured.
    pub fn current_axle(&self) -> u32 {
        self.current
    }

    pub fn current_slot(&self) -> ReadingSlot {
        ReadingSlot::Axle(self.current)
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state == OrchestratorState::Completed
    }

    pub fn axle_type(&self, axle_number: u32) -> AxleType {
        self.config.axle_type(axle_number)
    }

    /// Records captured so far, ordered by axle number.
    pub fn records(&self) -> impl Iterator<Item = &AxleWeightRecord> + '_ {
        self.records.values()
    }

    pub fn record(&self, axle_number: u32) -> Option<&AxleWeightRecord> {
        self.records.get(&axle_number)
    }

    /// Axles without a committed weight, ascending.
    pub fn missing_axles(&self) -> Vec<u32> {
        (1..=self.config.axle_count)
            .filter(|n| !self.records.contains_key(n))
            .collect()
    }

    /// Move to the next axle; no-op on the last one.
    pub fn advance(&mut self) {
        if self.current < self.config.axle_count {
            self.current += 1;
        }
    }

    /// Move back one axle to allow a re-capture; floor at axle 1.
    pub fn retreat(&mut self) {
        if self.current > 1 {
            self.current -= 1;
        }
    }

    /// Record `weight` for the current axle, replacing any earlier record for it,
    /// then advance. Capturing the last axle completes the set.
    pub fn on_axle_captured(&mut self, weight: f64) -> Result<OrchestratorState, WeighError> {
        if !weight.is_finite() {
            return Err(WeighError::invalid(format!(
                "non-finite weight for axle {}",
                self.current
            )));
        }
        let record = AxleWeightRecord {
            axle_number: self.current,
            weight,
            axle_type: self.axle_type(self.current),
        };
        if self.records.insert(self.current, record).is_some() {
            tracing::info!(axle = self.current, weight, "axle re-captured; previous weight replaced");
        } else {
            tracing::info!(axle = self.current, weight, axle_type = record.axle_type.as_str(), "axle captured");
        }
        if self.current >= self.config.axle_count {
            self.state = OrchestratorState::Completed;
            tracing::info!(axles = self.records.len(), "axle set complete");
        } else {
            self.advance();
        }
        Ok(self.state)
    }

    /// Drop all records and start over at axle 1.
    pub fn reset(&mut self) {
        self.records.clear();
        self.current = 1;
        self.state = OrchestratorState::InProgress;
    }

    /// Hand over the full ordered set. Only valid once completed with every axle recorded.
    pub fn finish(&self) -> Result<Vec<AxleWeightRecord>, WeighError> {
        if self.state != OrchestratorState::Completed {
            return Err(WeighError::invalid(format!(
                "finish before completion (axle {} of {})",
                self.current, self.config.axle_count
            )));
        }
        let missing = self.missing_axles();
        if !missing.is_empty() {
            return Err(WeighError::invalid(format!(
                "axles without a weight: {missing:?}"
            )));
        }
        Ok(self.records.values().copied().collect())
    }
}
