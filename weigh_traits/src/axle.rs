//! Axle configuration as supplied by the vehicle registry.

use serde::{Deserialize, Serialize};

/// Number of axles assumed when the vehicle registry cannot be reached.
pub const DEFAULT_AXLE_COUNT: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AxleType {
    Steering,
    Drive,
    Trailer,
    #[default]
    Unknown,
}

impl AxleType {
    /// Positional fallback: axle 1 steers, axles 2-3 drive, the rest are trailer axles.
    pub fn by_position(axle_number: u32) -> Self {
        match axle_number {
            1 => AxleType::Steering,
            2 | 3 => AxleType::Drive,
            n if n > 3 => AxleType::Trailer,
            _ => AxleType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AxleType::Steering => "steering",
            AxleType::Drive => "drive",
            AxleType::Trailer => "trailer",
            AxleType::Unknown => "unknown",
        }
    }
}

impl std::str::FromStr for AxleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "steering" | "steer" => Ok(AxleType::Steering),
            "drive" => Ok(AxleType::Drive),
            "trailer" => Ok(AxleType::Trailer),
            "unknown" => Ok(AxleType::Unknown),
            other => Err(format!("unknown axle type '{other}'")),
        }
    }
}

/// Read-only description of how many axles a vehicle has.
///
/// `axle_types` is optional per-axle metadata. When present for a position it
/// takes precedence over [`AxleType::by_position`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxleConfiguration {
    pub axle_count: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub axle_types: Vec<AxleType>,
}

impl AxleConfiguration {
    pub fn new(axle_count: u32, name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            axle_count,
            name: name.into(),
            kind: kind.into(),
            axle_types: Vec::new(),
        }
    }

    pub fn with_axle_types(mut self, axle_types: Vec<AxleType>) -> Self {
        self.axle_types = axle_types;
        self
    }

    /// Type for a 1-based axle number: configured metadata first, position otherwise.
    pub fn axle_type(&self, axle_number: u32) -> AxleType {
        axle_number
            .checked_sub(1)
            .and_then(|i| self.axle_types.get(i as usize).copied())
            .unwrap_or_else(|| AxleType::by_position(axle_number))
    }
}

impl Default for AxleConfiguration {
    fn default() -> Self {
        Self::new(DEFAULT_AXLE_COUNT, "default", "unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_fallback() {
        assert_eq!(AxleType::by_position(1), AxleType::Steering);
        assert_eq!(AxleType::by_position(2), AxleType::Drive);
        assert_eq!(AxleType::by_position(3), AxleType::Drive);
        assert_eq!(AxleType::by_position(4), AxleType::Trailer);
        assert_eq!(AxleType::by_position(9), AxleType::Trailer);
        assert_eq!(AxleType::by_position(0), AxleType::Unknown);
    }

    #[test]
    fn configured_types_win_over_position() {
        let cfg = AxleConfiguration::new(3, "tridem", "trailer").with_axle_types(vec![
            AxleType::Trailer,
            AxleType::Trailer,
        ]);
        assert_eq!(cfg.axle_type(1), AxleType::Trailer);
        assert_eq!(cfg.axle_type(2), AxleType::Trailer);
        // No metadata for axle 3 -> positional
        assert_eq!(cfg.axle_type(3), AxleType::Drive);
    }

    #[test]
    fn default_is_five_axles() {
        let cfg = AxleConfiguration::default();
        assert_eq!(cfg.axle_count, DEFAULT_AXLE_COUNT);
        assert!(cfg.axle_types.is_empty());
    }

    #[test]
    fn parses_axle_type_names() {
        assert_eq!("Steer".parse::<AxleType>().unwrap(), AxleType::Steering);
        assert_eq!(" drive ".parse::<AxleType>().unwrap(), AxleType::Drive);
        assert!("tandem".parse::<AxleType>().is_err());
    }
}
