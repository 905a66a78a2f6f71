//! Lifetime player statistics.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::game::scoring;

/// Aggregated results across all rounds a player has finished.
///
/// Invariants: `total_games == wins + losses` and
/// `best_streak >= current_streak`. `total_points` never decreases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    pub total_games: u64,
    pub wins: u64,
    pub losses: u64,
    pub current_streak: u32,
    pub best_streak: u32,
    pub total_points: u64,
}

/// What a single `record_outcome` call changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Award {
    /// Multiplier applied, read from the pre-round streak.
    pub multiplier: u64,
    pub points: u64,
    pub streak_after: u32,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "games={} (W{}/L{}) | win_rate={:.1}% | streak={} best={} | points={}",
            self.total_games,
            self.wins,
            self.losses,
            self.win_rate(),
            self.current_streak,
            self.best_streak,
            self.total_points,
        )
    }
}

impl Stats {
    /// Apply one resolved round. Must be called exactly once per round.
    pub fn record_outcome(&mut self, won: bool) -> Award {
        let multiplier = scoring::multiplier(self.current_streak);
        let points = scoring::points_for(won, self.current_streak);

        self.total_games += 1;
        if won {
            self.wins += 1;
            self.current_streak = self.current_streak.saturating_add(1);
        } else {
            self.losses += 1;
            self.current_streak = 0;
        }
        self.best_streak = self.best_streak.max(self.current_streak);
        self.total_points = self.total_points.saturating_add(points);

        Award {
            multiplier,
            points,
            streak_after: self.current_streak,
        }
    }

    /// Multiplier the next win would earn.
    pub fn next_multiplier(&self) -> u64 {
        scoring::multiplier(self.current_streak)
    }

    /// Win rate as a percentage. Returns 0.0 before the first game.
    pub fn win_rate(&self) -> f64 {
        if self.total_games == 0 {
            0.0
        } else {
            (self.wins as f64 / self.total_games as f64) * 100.0
        }
    }

    /// Whether the counters satisfy the stats invariants. Loaded state is
    /// checked with this before it is trusted.
    pub fn is_consistent(&self) -> bool {
        self.total_games == self.wins + self.losses && self.best_streak >= self.current_streak
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
