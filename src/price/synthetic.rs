//! Synthetic price generator.
//!
//! An Ornstein-Uhlenbeck style walk: uniform shocks scaled by √dt, pull
//! back toward a mean, a small upward drift and rare jumps, clamped to a
//! fixed band. Good enough to make 10-second rounds feel like a market.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Instant;

use super::{round_cents, PriceSource};
use crate::types::PriceQuote;

/// Walk parameters.
#[derive(Debug, Clone)]
pub struct WalkConfig {
    pub mean_price: f64,
    /// Shock amplitude as a fraction of price per √second.
    pub volatility: f64,
    /// Drift as a fraction of price per second.
    pub drift: f64,
    /// Fraction of the gap to the mean closed per second.
    pub mean_reversion: f64,
    /// Chance of a jump on any step.
    pub jump_probability: f64,
    /// Jump amplitude as a fraction of price.
    pub jump_size: f64,
    pub min_price: f64,
    pub max_price: f64,
    /// Starting price is drawn uniformly from this range.
    pub start_range: (f64, f64),
    /// Amplitude of the noise added to the 24h change, in percent.
    pub change_noise_pct: f64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            mean_price: 245.0,
            volatility: 0.0008,
            drift: 0.00001,
            mean_reversion: 0.002,
            jump_probability: 0.02,
            jump_size: 0.003,
            min_price: 220.0,
            max_price: 280.0,
            start_range: (244.0, 248.0),
            change_noise_pct: 1.0,
        }
    }
}

/// Random walk state, generic over the RNG so tests can seed it.
#[derive(Debug)]
pub struct RandomWalk<R: Rng> {
    config: WalkConfig,
    price: f64,
    rng: R,
}

impl<R: Rng> RandomWalk<R> {
    pub fn new(config: WalkConfig, mut rng: R) -> Self {
        let (lo, hi) = config.start_range;
        let price = if hi > lo { rng.random_range(lo..hi) } else { lo };
        let price = price.clamp(config.min_price, config.max_price);
        Self { config, price, rng }
    }

    /// Unrounded internal price.
    pub fn price(&self) -> f64 {
        self.price
    }

    /// Advance by `dt_secs` seconds and return `(price, change24h)`,
    /// both rounded to cents.
    pub fn step(&mut self, dt_secs: f64) -> (f64, f64) {
        let cfg = &self.config;
        let dt = dt_secs.max(0.0);
        let p = self.price;

        let shock = (self.rng.random::<f64>() - 0.5) * 2.0 * cfg.volatility * p * dt.sqrt();
        let reversion = (cfg.mean_price - p) * cfg.mean_reversion * dt;
        let drift = cfg.drift * p * dt;
        let jump = if self.rng.random::<f64>() < cfg.jump_probability {
            (self.rng.random::<f64>() - 0.5) * p * cfg.jump_size
        } else {
            0.0
        };

        self.price = (p + shock + reversion + drift + jump).clamp(cfg.min_price, cfg.max_price);

        let base_change = (self.price - cfg.mean_price) / cfg.mean_price * 100.0;
        let noise = (self.rng.random::<f64>() - 0.5) * 2.0 * cfg.change_noise_pct;

        (round_cents(self.price), round_cents(base_change + noise))
    }
}

/// `PriceSource` over a wall-clock driven random walk.
pub struct SyntheticPriceSource {
    state: Mutex<(RandomWalk<StdRng>, Instant)>,
    label: String,
}

impl SyntheticPriceSource {
    /// OS-seeded walk. Quotes are labelled `label`.
    pub fn new(config: WalkConfig, label: impl Into<String>) -> Self {
        Self::with_rng(config, StdRng::from_os_rng(), label)
    }

    pub fn seeded(config: WalkConfig, seed: u64, label: impl Into<String>) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed), label)
    }

    fn with_rng(config: WalkConfig, rng: StdRng, label: impl Into<String>) -> Self {
        Self {
            state: Mutex::new((RandomWalk::new(config, rng), Instant::now())),
            label: label.into(),
        }
    }

    /// Step the walk by the wall time since the previous call.
    pub fn next_quote(&self) -> Result<PriceQuote> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| anyhow::anyhow!("Synthetic price state poisoned"))?;
        let (walk, last) = &mut *guard;

        let now = Instant::now();
        let dt = now.duration_since(*last).as_secs_f64();
        *last = now;

        let (price, change24h) = walk.step(dt);
        Ok(PriceQuote {
            price,
            change24h,
            timestamp: Utc::now().timestamp_millis(),
            source: self.label.clone(),
        })
    }
}

#[async_trait]
impl PriceSource for SyntheticPriceSource {
    async fn fetch(&self) -> Result<PriceQuote> {
        self.next_quote()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
