//! Player store: stats, settings and leaderboard.
//!
//! Only `Stats` and `Settings` are persisted (see `storage`); the
//! leaderboard lives for the lifetime of the process.

pub mod leaderboard;
pub mod stats;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::Setting;
use leaderboard::{Leaderboard, LeaderboardEntry};
use stats::{Award, Stats};

/// Output-channel preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub sound_enabled: bool,
    pub haptic_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            haptic_enabled: true,
        }
    }
}

impl Settings {
    pub fn get(&self, setting: Setting) -> bool {
        match setting {
            Setting::Sound => self.sound_enabled,
            Setting::Haptic => self.haptic_enabled,
        }
    }

    /// Flip a preference and return its new value.
    pub fn toggle(&mut self, setting: Setting) -> bool {
        let flag = match setting {
            Setting::Sound => &mut self.sound_enabled,
            Setting::Haptic => &mut self.haptic_enabled,
        };
        *flag = !*flag;
        *flag
    }
}

/// The persisted slice of the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub stats: Stats,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_true")]
    pub haptic_enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Profile {
    fn default() -> Self {
        let settings = Settings::default();
        Self {
            stats: Stats::default(),
            sound_enabled: settings.sound_enabled,
            haptic_enabled: settings.haptic_enabled,
        }
    }
}

/// Stats, settings and leaderboard for one player.
#[derive(Debug, Clone, Default)]
pub struct PlayerStore {
    stats: Stats,
    settings: Settings,
    leaderboard: Leaderboard,
}

impl PlayerStore {
    pub fn new(profile: Profile, leaderboard_capacity: usize) -> Self {
        Self {
            stats: profile.stats,
            settings: Settings {
                sound_enabled: profile.sound_enabled,
                haptic_enabled: profile.haptic_enabled,
            },
            leaderboard: Leaderboard::with_capacity(leaderboard_capacity),
        }
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    /// Apply a resolved round to the stats.
    pub fn record_outcome(&mut self, won: bool) -> Award {
        let award = self.stats.record_outcome(won);
        info!(
            won,
            points = award.points,
            multiplier = award.multiplier,
            streak = award.streak_after,
            total_points = self.stats.total_points,
            "Outcome recorded"
        );
        award
    }

    pub fn submit_to_leaderboard(&mut self, entry: LeaderboardEntry) -> Option<usize> {
        let identifier = entry.identifier.clone();
        let points = entry.points;
        let rank = self.leaderboard.submit(entry);
        info!(%identifier, points, rank = ?rank, "Leaderboard submission");
        rank
    }

    pub fn toggle_setting(&mut self, setting: Setting) -> bool {
        let enabled = self.settings.toggle(setting);
        info!(%setting, enabled, "Setting toggled");
        enabled
    }

    /// Snapshot of everything that survives a restart.
    pub fn profile(&self) -> Profile {
        Profile {
            stats: self.stats.clone(),
            sound_enabled: self.settings.sound_enabled,
            haptic_enabled: self.settings.haptic_enabled,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_settings_default_on() {
        let s = Settings::default();
        assert!(s.get(Setting::Sound));
        assert!(s.get(Setting::Haptic));
    }

    #[test]
    fn test_toggle_setting_flips_only_that_flag() {
        let mut store = PlayerStore::default();
        assert!(!store.toggle_setting(Setting::Sound));
        assert!(!store.settings().sound_enabled);
        assert!(store.settings().haptic_enabled);
        assert!(store.toggle_setting(Setting::Sound));
        assert!(!store.toggle_setting(Setting::Haptic));
        assert_eq!(store.stats(), &Stats::default());
    }

    #[test]
    fn test_profile_roundtrips_through_store() {
        let mut store = PlayerStore::default();
        store.record_outcome(true);
        store.toggle_setting(Setting::Haptic);
        store.submit_to_leaderboard(LeaderboardEntry {
            identifier: "me".into(),
            points: 100,
            streak: 1,
            timestamp: Utc::now(),
        });

        let profile = store.profile();
        assert_eq!(profile.stats.wins, 1);
        assert!(profile.sound_enabled);
        assert!(!profile.haptic_enabled);

        let restored = PlayerStore::new(profile, 100);
        assert_eq!(restored.stats().wins, 1);
        assert!(!restored.settings().haptic_enabled);
        // The leaderboard is not part of the profile.
        assert!(restored.leaderboard().is_empty());
    }

    #[test]
    fn test_profile_missing_fields_use_defaults() {
        let profile: Profile = serde_json::from_str(r#"{"stats":{"wins":2,"totalGames":2}}"#).unwrap();
        assert_eq!(profile.stats.wins, 2);
        assert_eq!(profile.stats.losses, 0);
        assert!(profile.sound_enabled);
        assert!(profile.haptic_enabled);
    }
}
