//! Results handed to the ticket-creation side once captures are committed.

use serde::{Deserialize, Serialize};
use weigh_traits::{AxleType, ReadingSlot};

use crate::error::WeighError;

/// Committed weight for one axle. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxleWeightRecord {
    pub axle_number: u32,
    pub weight: f64,
    pub axle_type: AxleType,
}

/// What a completed capture workflow produces: one weight, or an ordered axle set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaptureOutcome {
    Single { slot: ReadingSlot, weight: f64 },
    Axles { records: Vec<AxleWeightRecord>, total: f64 },
}

impl CaptureOutcome {
    pub fn single(slot: ReadingSlot, weight: f64) -> Self {
        CaptureOutcome::Single { slot, weight }
    }

    pub fn axles(records: Vec<AxleWeightRecord>) -> Self {
        let total = axle_total(&records);
        CaptureOutcome::Axles { records, total }
    }
}

pub fn axle_total(records: &[AxleWeightRecord]) -> f64 {
    records.iter().map(|r| r.weight).sum()
}

/// Gross / tare / net for one weighing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeighTicket {
    pub gross: f64,
    pub tare: f64,
    pub net: f64,
    /// Set when a gross limit was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overloaded: Option<bool>,
}

impl WeighTicket {
    /// `net = gross - tare`. A tare heavier than the gross is rejected.
    pub fn new(gross: f64, tare: f64) -> Result<Self, WeighError> {
        if !gross.is_finite() || !tare.is_finite() {
            return Err(WeighError::invalid("gross and tare must be finite"));
        }
        if tare < 0.0 {
            return Err(WeighError::invalid(format!("negative tare {tare}")));
        }
        if tare > gross {
            return Err(WeighError::invalid(format!(
                "tare {tare} exceeds gross {gross}"
            )));
        }
        Ok(Self {
            gross,
            tare,
            net: gross - tare,
            overloaded: None,
        })
    }

    pub fn with_gross_limit(mut self, max_gross: Option<f64>) -> Self {
        self.overloaded = max_gross.map(|limit| self.gross > limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_is_gross_minus_tare() {
        let t = WeighTicket::new(40_000.0, 14_500.0).unwrap();
        assert_eq!(t.net, 25_500.0);
        assert_eq!(t.overloaded, None);
    }

    #[test]
    fn tare_above_gross_is_rejected() {
        let e = WeighTicket::new(10_000.0, 12_000.0).unwrap_err();
        assert!(matches!(e, WeighError::InvalidCaptureRequest(_)));
    }

    #[test]
    fn gross_limit_flags_overload() {
        let t = WeighTicket::new(44_100.0, 15_000.0)
            .unwrap()
            .with_gross_limit(Some(44_000.0));
        assert_eq!(t.overloaded, Some(true));
        let t = t.with_gross_limit(Some(50_000.0));
        assert_eq!(t.overloaded, Some(false));
    }

    #[test]
    fn axle_outcome_serializes_total() {
        let records = vec![
            AxleWeightRecord {
                axle_number: 1,
                weight: 5_000.0,
                axle_type: AxleType::Steering,
            },
            AxleWeightRecord {
                axle_number: 2,
                weight: 8_000.0,
                axle_type: AxleType::Drive,
            },
        ];
        let json = serde_json::to_value(CaptureOutcome::axles(records)).unwrap();
        assert_eq!(json["kind"], "axles");
        assert_eq!(json["total"], 13_000.0);
        assert_eq!(json["records"][1]["axle_type"], "drive");
    }
}
