//! Streak-based scoring.
//!
//! A win is worth `BASE_POINTS` times a multiplier that grows with the
//! player's current win streak. The multiplier is read from the streak
//! *before* the round's result is applied, which is also the value shown
//! to the player as a preview while the round runs.

/// Points for a win at 1× multiplier.
pub const BASE_POINTS: u64 = 100;

/// Highest multiplier a streak can reach.
pub const MAX_MULTIPLIER: u64 = 5;

/// Streak thresholds, highest first.
const TIERS: &[(u32, u64)] = &[(10, 5), (7, 4), (5, 3), (3, 2)];

/// Multiplier for a given pre-round streak.
pub fn multiplier(streak: u32) -> u64 {
    TIERS
        .iter()
        .find(|(threshold, _)| streak >= *threshold)
        .map(|(_, m)| *m)
        .unwrap_or(1)
}

/// Points awarded for a round resolved at the given pre-round streak.
pub fn points_for(won: bool, streak: u32) -> u64 {
    if won {
        BASE_POINTS * multiplier(streak)
    } else {
        0
    }
}

/// Wins still needed from `streak` to reach the next multiplier tier,
/// or `None` when already at the top tier.
pub fn wins_to_next_tier(streak: u32) -> Option<u32> {
    TIERS
        .iter()
        .rev()
        .find(|(threshold, _)| streak < *threshold)
        .map(|(threshold, _)| threshold - streak)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
