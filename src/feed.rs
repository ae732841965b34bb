//! Seeded mock option-chain feed for offline runs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::{ChainSnapshot, OptionRecord, OptionSide, Signal};
use crate::utils::{round_to, symbol_seed};

const STRIKE_STEP: i64 = 50;
const STRIKES_EACH_SIDE: i64 = 10;

pub struct MockFeed {
    rng: StdRng,
}

impl MockFeed {
    /// `None` seeds from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    /// Spot around a per-symbol base plus CE/PE records every 50 points
    /// within +/-500 of spot. Delta peaks at 0.5 near the money.
    pub fn snapshot(&mut self, symbol: &str) -> ChainSnapshot {
        let base = 15_000 + (symbol_seed(symbol) % 1_000) as i64;
        let spot = (base + self.rng.random_range(-100..=100)) as f64;

        let centre = spot as i64;
        let lo = centre - STRIKE_STEP * STRIKES_EACH_SIDE;
        let hi = centre + STRIKE_STEP * STRIKES_EACH_SIDE;
        let mut strikes = Vec::new();
        for s in (lo..=hi).step_by(STRIKE_STEP as usize) {
            for side in [OptionSide::Call, OptionSide::Put] {
                let strike = s as f64;
                let distance = (strike - spot).abs();
                let premium = (distance / 15.0 + self.rng.random_range(-1.0..1.0)).max(0.5);
                let delta = (0.5 - distance / 1_000.0).clamp(0.01, 0.99);
                strikes.push(OptionRecord {
                    strike,
                    side,
                    delta: if side == OptionSide::Call { delta } else { -delta },
                    open_interest: self.rng.random_range(5..=2_000),
                    volume: self.rng.random_range(0..=500),
                    premium: round_to(premium, 2),
                });
            }
        }
        ChainSnapshot { spot, strikes }
    }

    pub fn random_signal(&mut self) -> Signal {
        if self.rng.random_bool(0.5) {
            Signal::Bullish
        } else {
            Signal::Bearish
        }
    }

    /// `premium` moved by a uniform draw in +/- `max_pct` percent.
    pub fn next_premium(&mut self, premium: f64, max_pct: f64) -> f64 {
        let bound = max_pct.abs() / 100.0;
        let pct = if bound > 0.0 {
            self.rng.random_range(-bound..=bound)
        } else {
            0.0
        };
        round_to(premium * (1.0 + pct), 4)
    }
}
