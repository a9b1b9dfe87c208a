//! Simulated platform scale.
//!
//! Each slot has a target weight. After the slot changes the reading starts
//! `approach` units away from the target and closes the gap geometrically by
//! `decay` per poll, with uniform jitter on top. Seeded, so runs are repeatable.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use weigh_traits::{ReadingSlot, ReadingSource};

use crate::error::SourceError;

#[derive(Debug, Clone)]
pub struct SimProfile {
    pub gross: f64,
    pub tare: f64,
    /// Per-axle targets, 1-based by index + 1. Missing axles use `gross / 5`.
    pub axles: Vec<f64>,
    pub approach: f64,
    pub decay: f64,
    pub jitter: f64,
    /// Every Nth poll fails with `Unavailable`; 0 disables dropouts.
    pub dropout_every: u32,
    pub seed: u64,
}

impl Default for SimProfile {
    fn default() -> Self {
        Self {
            gross: 40_000.0,
            tare: 14_500.0,
            axles: vec![5_400.0, 8_600.0, 8_600.0, 8_700.0, 8_700.0],
            approach: 400.0,
            decay: 0.5,
            jitter: 2.0,
            dropout_every: 0,
            seed: 7,
        }
    }
}

impl SimProfile {
    pub fn target(&self, slot: ReadingSlot) -> f64 {
        match slot {
            ReadingSlot::Gross => self.gross,
            ReadingSlot::Tare => self.tare,
            ReadingSlot::Axle(n) => n
                .checked_sub(1)
                .and_then(|i| self.axles.get(i as usize).copied())
                .unwrap_or(self.gross / 5.0),
        }
    }
}

pub struct SimulatedScale {
    profile: SimProfile,
    rng: StdRng,
    slot: Option<ReadingSlot>,
    polls_in_slot: u32,
    polls_total: u64,
}

impl SimulatedScale {
    pub fn new(profile: SimProfile) -> Self {
        let rng = StdRng::seed_from_u64(profile.seed);
        Self {
            profile,
            rng,
            slot: None,
            polls_in_slot: 0,
            polls_total: 0,
        }
    }

    pub fn profile(&self) -> &SimProfile {
        &self.profile
    }

    fn next_value(&mut self, slot: ReadingSlot) -> f64 {
        if self.slot != Some(slot) {
            self.slot = Some(slot);
            self.polls_in_slot = 0;
        }
        let n = self.polls_in_slot;
        self.polls_in_slot = self.polls_in_slot.saturating_add(1);
        let decay = self.profile.decay.clamp(0.0, 1.0);
        let offset = self.profile.approach * decay.powi(n.min(i32::MAX as u32) as i32);
        let jitter = self.profile.jitter.abs();
        let noise = if jitter > 0.0 {
            self.rng.gen_range(-jitter..=jitter)
        } else {
            0.0
        };
        self.profile.target(slot) + offset + noise
    }
}

impl Default for SimulatedScale {
    fn default() -> Self {
        Self::new(SimProfile::default())
    }
}

impl ReadingSource for SimulatedScale {
    fn poll(
        &mut self,
        slot: ReadingSlot,
        _timeout: std::time::Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        self.polls_total = self.polls_total.saturating_add(1);
        let every = u64::from(self.profile.dropout_every);
        if every > 0 && self.polls_total % every == 0 {
            tracing::debug!(%slot, poll = self.polls_total, "simulated dropout");
            return Err(Box::new(SourceError::Unavailable(
                "simulated dropout".into(),
            )));
        }
        let value = self.next_value(slot);
        tracing::trace!(%slot, value, "simulated reading");
        Ok(value)
    }
}
