//! Shared types for the PRICE CLASH game server.
//!
//! These types form the data model used across all modules. The game,
//! store, price and server modules depend on them without depending on
//! each other's internals.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Bet direction: will the price rise or fall over the round?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Whether a move from `locked` to `price` favours this direction.
    /// An unchanged price favours neither.
    pub fn is_favoured(&self, locked: f64, price: f64) -> bool {
        match self {
            Direction::Up => price > locked,
            Direction::Down => price < locked,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "UP"),
            Direction::Down => write!(f, "DOWN"),
        }
    }
}

/// Parse a direction (case-insensitive).
impl std::str::FromStr for Direction {
    type Err = ClashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" | "higher" | "long" => Ok(Direction::Up),
            "down" | "lower" | "short" => Ok(Direction::Down),
            _ => Err(ClashError::UnknownDirection(s.to_string())),
        }
    }
}

/// Round lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    Idle,
    Playing,
    Won,
    Lost,
}

impl Phase {
    /// Whether the round has resolved and awaits acknowledgment.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Won | Phase::Lost)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "IDLE"),
            Phase::Playing => write!(f, "PLAYING"),
            Phase::Won => write!(f, "WON"),
            Phase::Lost => write!(f, "LOST"),
        }
    }
}

/// Result of a resolved round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Won,
    Lost,
}

impl Outcome {
    pub fn is_win(&self) -> bool {
        *self == Outcome::Won
    }

    /// The terminal phase a round enters with this outcome.
    pub fn phase(&self) -> Phase {
        match self {
            Outcome::Won => Phase::Won,
            Outcome::Lost => Phase::Lost,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Won => write!(f, "WON"),
            Outcome::Lost => write!(f, "LOST"),
        }
    }
}

/// A boolean player preference. Output-channel control only; never
/// consulted by the game rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Setting {
    Sound,
    Haptic,
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Setting::Sound => write!(f, "sound"),
            Setting::Haptic => write!(f, "haptic"),
        }
    }
}

impl std::str::FromStr for Setting {
    type Err = ClashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sound" | "soundenabled" => Ok(Setting::Sound),
            "haptic" | "haptics" | "hapticenabled" => Ok(Setting::Haptic),
            _ => Err(ClashError::UnknownSetting(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Price quote
// ---------------------------------------------------------------------------

/// A single price observation from a price source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub price: f64,
    pub change24h: f64,
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
    /// Where the quote came from: "live", "cache", "remote", ...
    pub source: String,
}

impl fmt::Display for PriceQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.change24h >= 0.0 { "+" } else { "" };
        write!(
            f,
            "${:.2} ({sign}{:.2}% 24h) [{}]",
            self.price, self.change24h, self.source,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for PRICE CLASH.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClashError {
    #[error("Cannot {action} while round is {phase}")]
    InvalidTransition { phase: Phase, action: &'static str },

    #[error("Invalid price: {0}")]
    InvalidPrice(f64),

    #[error("Unknown direction: {0}")]
    UnknownDirection(String),

    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    #[error("Price feed disconnected: {0}")]
    PriceUnavailable(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
