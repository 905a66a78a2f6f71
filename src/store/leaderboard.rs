//! Ranked leaderboard.
//!
//! Entries are kept sorted by points, highest first, and truncated to a
//! fixed capacity. There is no de-duplication: the same identifier may
//! appear any number of times.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default number of entries kept.
pub const DEFAULT_CAPACITY: usize = 100;

/// One submitted score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// Wallet address or display name.
    pub identifier: String,
    pub points: u64,
    pub streak: u32,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for LeaderboardEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} pts (streak {})",
            self.identifier, self.points, self.streak
        )
    }
}

#[derive(Debug, Clone)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
    capacity: usize,
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl Leaderboard {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Insert an entry, re-rank and truncate.
    ///
    /// Returns the entry's 1-based rank, or `None` if it fell off the end.
    /// The sort is stable, so an entry ties below earlier equal scores.
    pub fn submit(&mut self, entry: LeaderboardEntry) -> Option<usize> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.points < entry.points)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        self.entries.truncate(self.capacity);

        (pos < self.capacity).then_some(pos + 1)
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
