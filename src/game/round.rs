//! Round state machine.
//!
//! `Idle → Playing → Won | Lost → Idle`. A round locks the price at bet
//! time, counts down one second per tick and resolves against the last
//! observed price when the countdown reaches zero. Once started a round
//! always runs to resolution; there is no cancel.

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::types::{ClashError, Direction, Outcome, Phase};

/// Default round length in seconds.
pub const ROUND_DURATION_SECS: u32 = 10;

/// Remaining seconds at or below which ticks are urgent.
pub const URGENCY_THRESHOLD_SECS: u32 = 4;

/// What a single countdown tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    /// Countdown advanced.
    Counting { remaining: u32 },
    /// Countdown hit zero and the round resolved.
    Resolved(Resolution),
}

/// Everything known about a round at the moment it resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub round_id: Uuid,
    pub outcome: Outcome,
    pub direction: Direction,
    pub locked_price: f64,
    pub final_price: f64,
}

impl Resolution {
    /// Signed price move over the round.
    pub fn price_move(&self) -> f64 {
        self.final_price - self.locked_price
    }
}

/// A single bet-to-resolution cycle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    id: Option<Uuid>,
    phase: Phase,
    bet_direction: Option<Direction>,
    locked_price: Option<f64>,
    current_price: f64,
    time_remaining: u32,
    round_duration: u32,
}

impl Default for Round {
    fn default() -> Self {
        Self::new(ROUND_DURATION_SECS)
    }
}

impl Round {
    /// An idle round with the given countdown length (clamped to ≥ 1s).
    pub fn new(round_duration: u32) -> Self {
        Self {
            id: None,
            phase: Phase::Idle,
            bet_direction: None,
            locked_price: None,
            current_price: 0.0,
            time_remaining: 0,
            round_duration: round_duration.max(1),
        }
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn bet_direction(&self) -> Option<Direction> {
        self.bet_direction
    }

    pub fn locked_price(&self) -> Option<f64> {
        self.locked_price
    }

    pub fn current_price(&self) -> f64 {
        self.current_price
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn round_duration(&self) -> u32 {
        self.round_duration
    }

    /// Record the latest price from the price source. Allowed in any phase;
    /// never touches the locked price.
    pub fn observe_price(&mut self, price: f64) {
        if price.is_finite() && price > 0.0 {
            self.current_price = price;
        }
    }

    /// Whether the next tick falls inside the urgency window.
    pub fn is_urgent(&self) -> bool {
        self.phase == Phase::Playing
            && self.time_remaining > 0
            && self.time_remaining <= URGENCY_THRESHOLD_SECS
    }

    /// Whether the bet would win if the round resolved right now.
    /// `None` outside `Playing`.
    pub fn is_winning(&self) -> Option<bool> {
        if self.phase != Phase::Playing {
            return None;
        }
        let direction = self.bet_direction?;
        let locked = self.locked_price?;
        Some(direction.is_favoured(locked, self.current_price))
    }

    /// Place a bet: lock `price`, arm the countdown and enter `Playing`.
    pub fn start(&mut self, direction: Direction, price: f64) -> Result<Uuid, ClashError> {
        if self.phase != Phase::Idle {
            return Err(ClashError::InvalidTransition {
                phase: self.phase,
                action: "start a round",
            });
        }
        if !price.is_finite() || price <= 0.0 {
            return Err(ClashError::InvalidPrice(price));
        }

        let id = Uuid::new_v4();
        self.id = Some(id);
        self.bet_direction = Some(direction);
        self.locked_price = Some(price);
        self.current_price = price;
        self.time_remaining = self.round_duration;
        self.phase = Phase::Playing;

        debug!(round = %id, %direction, price, "Round started");
        Ok(id)
    }

    /// Advance the countdown by one second. The tick that reaches zero
    /// resolves the round against the current price.
    pub fn tick(&mut self) -> Result<Tick, ClashError> {
        if self.phase != Phase::Playing {
            return Err(ClashError::InvalidTransition {
                phase: self.phase,
                action: "tick",
            });
        }

        self.time_remaining = self.time_remaining.saturating_sub(1);

        if self.time_remaining == 0 {
            let final_price = self.current_price;
            return self.resolve(final_price).map(Tick::Resolved);
        }

        Ok(Tick::Counting {
            remaining: self.time_remaining,
        })
    }

    /// Settle the bet against `final_price`. An unchanged price loses for
    /// both directions.
    pub fn resolve(&mut self, final_price: f64) -> Result<Resolution, ClashError> {
        let (Phase::Playing, Some(id), Some(direction), Some(locked_price)) =
            (self.phase, self.id, self.bet_direction, self.locked_price)
        else {
            return Err(ClashError::InvalidTransition {
                phase: self.phase,
                action: "resolve",
            });
        };

        if !final_price.is_finite() || final_price <= 0.0 {
            return Err(ClashError::InvalidPrice(final_price));
        }

        let outcome = if direction.is_favoured(locked_price, final_price) {
            Outcome::Won
        } else {
            Outcome::Lost
        };

        self.time_remaining = 0;
        self.current_price = final_price;
        self.phase = outcome.phase();

        debug!(round = %id, %direction, locked_price, final_price, %outcome, "Round resolved");

        Ok(Resolution {
            round_id: id,
            outcome,
            direction,
            locked_price,
            final_price,
        })
    }

    /// Acknowledge a resolved round and return to `Idle`.
    pub fn reset(&mut self) -> Result<(), ClashError> {
        if !self.phase.is_terminal() {
            return Err(ClashError::InvalidTransition {
                phase: self.phase,
                action: "reset",
            });
        }
        let current_price = self.current_price;
        *self = Self::new(self.round_duration);
        self.current_price = current_price;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
