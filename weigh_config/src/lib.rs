#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and fleet parsing for the weighing stack.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//!   Every section is optional; an empty file is a valid simulated-scale setup.
//! - The fleet CSV loader enforces headers and yields a `VehicleLookup`.
use std::collections::HashMap;

use serde::Deserialize;
use weigh_traits::{AxleConfiguration, AxleType, VehicleLookup};

/// How the weight reaches us. Purely descriptive for the core; the CLI uses it to
/// pick a source.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    #[default]
    Scale,
    Iot,
    Camera,
    Manual,
}

/// Backend serving readings for the non-manual methods.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    #[default]
    Sim,
    Http,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourceCfg {
    pub method: Method,
    pub driver: Driver,
    /// Device identifier on the scale gateway (`driver = "http"`)
    pub device_id: Option<String>,
    /// Gateway base URL, e.g. "http://10.0.0.12:8080" (`driver = "http"`)
    pub base_url: Option<String>,
    /// Simulator targets; unset fields keep the simulator's defaults
    pub sim_gross: Option<f64>,
    pub sim_tare: Option<f64>,
    pub sim_axles: Vec<f64>,
    pub sim_jitter: f64,
    /// Every Nth simulated poll fails (0 disables)
    pub sim_dropout_every: u32,
    pub seed: u64,
}

impl Default for SourceCfg {
    fn default() -> Self {
        Self {
            method: Method::Scale,
            driver: Driver::Sim,
            device_id: None,
            base_url: None,
            sim_gross: None,
            sim_tare: None,
            sim_axles: Vec::new(),
            sim_jitter: 2.0,
            sim_dropout_every: 0,
            seed: 7,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CaptureCfg {
    pub poll_interval_ms: u64,
    pub window_capacity: usize,
    pub min_samples: usize,
    /// Consecutive readings must differ by strictly less than this (weight units)
    pub stability_threshold: f64,
    pub auto_capture: bool,
    /// Escalate after this many failed polls in a row (0 = retry forever)
    pub max_consecutive_failures: u32,
    /// Give up a capture after this long (0 = wait forever)
    pub max_wait_ms: u64,
}

impl Default for CaptureCfg {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            window_capacity: 5,
            min_samples: 3,
            stability_threshold: 20.0,
            auto_capture: true,
            max_consecutive_failures: 0,
            max_wait_ms: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Max wait per source poll (ms). Also accepts alias "poll_ms".
    #[serde(alias = "poll_ms")]
    pub source_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { source_ms: 800 }
    }
}

/// Static vehicle description, used when no fleet file is given.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct VehicleCfg {
    /// When set, lookups for any other vehicle id fail
    pub id: Option<String>,
    pub axle_count: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub axle_types: Vec<AxleType>,
    /// Legal gross limit; tickets above it are flagged overloaded
    pub max_gross: Option<f64>,
}

impl Default for VehicleCfg {
    fn default() -> Self {
        let d = AxleConfiguration::default();
        Self {
            id: None,
            axle_count: d.axle_count,
            name: d.name,
            kind: d.kind,
            axle_types: Vec::new(),
            max_gross: None,
        }
    }
}

impl VehicleCfg {
    pub fn to_axle_configuration(&self) -> AxleConfiguration {
        AxleConfiguration::new(self.axle_count, self.name.clone(), self.kind.clone())
            .with_axle_types(self.axle_types.clone())
    }
}

impl VehicleLookup for VehicleCfg {
    fn axle_configuration(
        &self,
        vehicle_id: &str,
    ) -> Result<AxleConfiguration, Box<dyn std::error::Error + Send + Sync>> {
        match &self.id {
            Some(id) if id != vehicle_id => {
                Err(format!("vehicle '{vehicle_id}' is not the configured vehicle '{id}'").into())
            }
            _ => Ok(self.to_axle_configuration()),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Poller,
    Direct,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RunnerCfg {
    /// Default orchestration mode: "poller" (background thread) or "direct"
    pub mode: RunMode,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub source: SourceCfg,
    pub capture: CaptureCfg,
    pub timeouts: Timeouts,
    pub vehicle: Option<VehicleCfg>,
    pub logging: Logging,
    /// Runner/orchestration defaults
    pub runner: RunnerCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Source
        if self.source.driver == Driver::Http && self.source.method != Method::Manual {
            match self.source.base_url.as_deref() {
                None | Some("") => eyre::bail!("source.base_url must be set when source.driver = \"http\""),
                Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                    eyre::bail!("source.base_url must start with http:// or https://")
                }
                Some(_) => {}
            }
            if self.source.device_id.as_deref().is_none_or(str::is_empty) {
                eyre::bail!("source.device_id must be set when source.driver = \"http\"");
            }
        }
        if !self.source.sim_jitter.is_finite() || self.source.sim_jitter < 0.0 {
            eyre::bail!("source.sim_jitter must be finite and >= 0.0");
        }
        let sim_targets = [self.source.sim_gross, self.source.sim_tare]
            .into_iter()
            .flatten()
            .chain(self.source.sim_axles.iter().copied());
        for t in sim_targets {
            if !t.is_finite() || t < 0.0 {
                eyre::bail!("source.sim_* weights must be finite and >= 0.0");
            }
        }

        // Capture
        if self.capture.poll_interval_ms == 0 {
            eyre::bail!("capture.poll_interval_ms must be >= 1");
        }
        if self.capture.poll_interval_ms > 60 * 1000 {
            eyre::bail!("capture.poll_interval_ms is unreasonably large (>1min)");
        }
        if self.capture.window_capacity == 0 {
            eyre::bail!("capture.window_capacity must be >= 1");
        }
        if self.capture.min_samples < 3 {
            eyre::bail!("capture.min_samples must be >= 3");
        }
        if self.capture.min_samples > self.capture.window_capacity {
            eyre::bail!("capture.min_samples must be <= capture.window_capacity");
        }
        if !self.capture.stability_threshold.is_finite() || self.capture.stability_threshold <= 0.0 {
            eyre::bail!("capture.stability_threshold must be finite and > 0.0");
        }

        // Timeouts
        if self.timeouts.source_ms == 0 {
            eyre::bail!("timeouts.source_ms must be >= 1");
        }

        // Vehicle
        if let Some(v) = &self.vehicle {
            if v.axle_count == 0 {
                eyre::bail!("vehicle.axle_count must be >= 1");
            }
            if v.axle_types.len() > v.axle_count as usize {
                eyre::bail!("vehicle.axle_types must not list more entries than vehicle.axle_count");
            }
            if let Some(max) = v.max_gross
                && !(max.is_finite() && max > 0.0)
            {
                eyre::bail!("vehicle.max_gross must be finite and > 0.0");
            }
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        // Runner: no extra validation; serde restricts to known modes

        Ok(())
    }
}

/// Fleet CSV schema.
///
/// Expected headers:
/// vehicle_id,name,type,axle_count,axle_types
///
/// `axle_types` is an optional `;`-separated list, one entry per axle from axle 1.
///
/// Example:
/// vehicle_id,name,type,axle_count,axle_types
/// TRK-001,Volvo FH 6x4,tractor,3,steering;drive;drive
/// TRL-207,Krone tri-axle,trailer,3,
#[derive(Debug, Deserialize, Clone)]
pub struct FleetRow {
    pub vehicle_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub axle_count: u32,
    #[serde(default)]
    pub axle_types: String,
}

/// Parse a `;`-separated axle type list. Blank input means no per-axle metadata.
pub fn parse_axle_types(s: &str) -> eyre::Result<Vec<AxleType>> {
    s.split(';')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<AxleType>().map_err(|e| eyre::eyre!(e)))
        .collect()
}

/// Vehicle registry backed by a fleet CSV file.
#[derive(Debug, Default, Clone)]
pub struct FleetCsv {
    vehicles: HashMap<String, AxleConfiguration>,
}

impl FleetCsv {
    pub fn from_rows(rows: Vec<FleetRow>) -> eyre::Result<Self> {
        let mut vehicles = HashMap::with_capacity(rows.len());
        for row in rows {
            if row.vehicle_id.trim().is_empty() {
                eyre::bail!("fleet row has an empty vehicle_id");
            }
            if row.axle_count == 0 {
                eyre::bail!("vehicle {} has axle_count 0", row.vehicle_id);
            }
            let types = parse_axle_types(&row.axle_types)
                .map_err(|e| eyre::eyre!("vehicle {}: {}", row.vehicle_id, e))?;
            if types.len() > row.axle_count as usize {
                eyre::bail!(
                    "vehicle {} lists {} axle types for {} axles",
                    row.vehicle_id,
                    types.len(),
                    row.axle_count
                );
            }
            let cfg =
                AxleConfiguration::new(row.axle_count, row.name, row.kind).with_axle_types(types);
            if vehicles.insert(row.vehicle_id.clone(), cfg).is_some() {
                eyre::bail!("duplicate vehicle_id {} in fleet", row.vehicle_id);
            }
        }
        Ok(Self { vehicles })
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn get(&self, vehicle_id: &str) -> Option<&AxleConfiguration> {
        self.vehicles.get(vehicle_id)
    }
}

impl VehicleLookup for FleetCsv {
    fn axle_configuration(
        &self,
        vehicle_id: &str,
    ) -> Result<AxleConfiguration, Box<dyn std::error::Error + Send + Sync>> {
        self.get(vehicle_id)
            .cloned()
            .ok_or_else(|| format!("vehicle '{vehicle_id}' not found in fleet").into())
    }
}

pub fn load_fleet_csv(path: &std::path::Path) -> eyre::Result<FleetCsv> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open fleet CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["vehicle_id", "name", "type", "axle_count", "axle_types"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "fleet CSV must have headers 'vehicle_id,name,type,axle_count,axle_types', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<FleetRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    FleetCsv::from_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_valid_default() {
        let cfg = load_toml("").unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.capture.window_capacity, 5);
        assert_eq!(cfg.capture.min_samples, 3);
        assert_eq!(cfg.capture.stability_threshold, 20.0);
        assert_eq!(cfg.runner.mode, RunMode::Poller);
        assert!(cfg.vehicle.is_none());
    }

    #[test]
    fn axle_type_list_parses_and_trims() {
        let v = parse_axle_types(" steering; drive ;;trailer").unwrap();
        assert_eq!(v, vec![AxleType::Steering, AxleType::Drive, AxleType::Trailer]);
        assert!(parse_axle_types("").unwrap().is_empty());
        assert!(parse_axle_types("steering;bogie").is_err());
    }

    #[test]
    fn static_vehicle_rejects_other_ids() {
        let v = VehicleCfg {
            id: Some("TRK-001".into()),
            ..VehicleCfg::default()
        };
        assert!(VehicleLookup::axle_configuration(&v, "TRK-001").is_ok());
        assert!(VehicleLookup::axle_configuration(&v, "TRK-002").is_err());
    }
}
