//! Game session: the single owner of all mutable game state.
//!
//! Wraps the round, the player store and the event bus. Every mutation
//! goes through here so persistence (serialize-on-mutate) and event
//! emission happen in one place. Shared across tasks as
//! `Arc<RwLock<GameSession>>`; the lock serialises callbacks.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::events::{EventBus, GameEvent};
use super::round::{Resolution, Round, Tick};
use crate::storage;
use crate::store::leaderboard::LeaderboardEntry;
use crate::store::stats::Stats;
use crate::store::{PlayerStore, Profile};
use crate::types::{ClashError, Direction, Setting};

pub type SharedSession = Arc<RwLock<GameSession>>;

/// Result of a round as applied to the player's stats.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    #[serde(flatten)]
    pub resolution: Resolution,
    pub points: u64,
    pub multiplier: u64,
    pub streak: u32,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub round_duration: u32,
    pub leaderboard_capacity: usize,
    /// Where to persist the profile; `None` keeps it in memory only.
    pub storage_path: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            round_duration: super::round::ROUND_DURATION_SECS,
            leaderboard_capacity: crate::store::leaderboard::DEFAULT_CAPACITY,
            storage_path: None,
        }
    }
}

pub struct GameSession {
    round: Round,
    store: PlayerStore,
    events: EventBus,
    storage_path: Option<String>,
    last_result: Option<RoundSummary>,
}

impl GameSession {
    pub fn new(config: SessionConfig, profile: Profile) -> Self {
        Self {
            round: Round::new(config.round_duration),
            store: PlayerStore::new(profile, config.leaderboard_capacity),
            events: EventBus::default(),
            storage_path: config.storage_path,
            last_result: None,
        }
    }

    /// Build a session whose profile is loaded from its storage path.
    pub fn restore(config: SessionConfig) -> Self {
        let profile = match config.storage_path.as_deref() {
            Some(path) => storage::load_profile(Some(path)),
            None => Profile::default(),
        };
        Self::new(config, profile)
    }

    pub fn shared(self) -> SharedSession {
        Arc::new(RwLock::new(self))
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn store(&self) -> &PlayerStore {
        &self.store
    }

    pub fn stats(&self) -> &Stats {
        self.store.stats()
    }

    /// Summary of the most recent resolution while it awaits reset.
    pub fn last_result(&self) -> Option<&RoundSummary> {
        self.last_result.as_ref()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    pub fn observe_price(&mut self, price: f64) {
        self.round.observe_price(price);
    }

    /// Place a bet at `price`. Rejected unless the round is idle.
    pub fn start_round(&mut self, direction: Direction, price: f64) -> Result<Uuid, ClashError> {
        let round_id = self.round.start(direction, price).map_err(|e| {
            warn!(error = %e, %direction, price, "Bet rejected");
            e
        })?;

        info!(
            round = %round_id,
            %direction,
            locked_price = price,
            multiplier = self.store.stats().next_multiplier(),
            "Bet placed"
        );
        self.events.emit(GameEvent::RoundStarted {
            round_id,
            direction,
            locked_price: price,
            duration: self.round.round_duration(),
        });
        Ok(round_id)
    }

    /// One countdown second. Returns the summary on the tick that resolves.
    pub fn tick(&mut self) -> Result<Option<RoundSummary>, ClashError> {
        let urgent = self.round.is_urgent();
        let remaining_before = self.round.time_remaining();
        let round_id = self.round.id();

        let tick = self.round.tick()?;

        if let (true, Some(round_id)) = (urgent, round_id) {
            let settings = self.store.settings();
            self.events.emit(GameEvent::Urgency {
                round_id,
                remaining: remaining_before,
                sound: settings.get(Setting::Sound),
                haptic: settings.get(Setting::Haptic),
            });
        }

        match tick {
            Tick::Counting { remaining } => {
                if let Some(round_id) = round_id {
                    self.events.emit(GameEvent::Countdown { round_id, remaining });
                }
                Ok(None)
            }
            Tick::Resolved(resolution) => Ok(Some(self.settle(resolution))),
        }
    }

    /// Settle the running round immediately against `final_price`.
    pub fn resolve(&mut self, final_price: f64) -> Result<RoundSummary, ClashError> {
        let resolution = self.round.resolve(final_price)?;
        Ok(self.settle(resolution))
    }

    /// Acknowledge the result and return to idle.
    pub fn reset(&mut self) -> Result<(), ClashError> {
        self.round.reset()?;
        self.last_result = None;
        self.events.emit(GameEvent::RoundReset);
        Ok(())
    }

    /// Add an entry to the leaderboard; returns its rank if it made the cut.
    pub fn submit_to_leaderboard(&mut self, entry: LeaderboardEntry) -> Option<usize> {
        let identifier = entry.identifier.clone();
        let rank = self.store.submit_to_leaderboard(entry);
        self.events.emit(GameEvent::LeaderboardUpdated { identifier, rank });
        rank
    }

    pub fn toggle_setting(&mut self, setting: Setting) -> bool {
        let enabled = self.store.toggle_setting(setting);
        self.persist();
        self.events.emit(GameEvent::SettingChanged { setting, enabled });
        enabled
    }

    fn settle(&mut self, resolution: Resolution) -> RoundSummary {
        let award = self.store.record_outcome(resolution.outcome.is_win());
        self.persist();

        info!(
            round = %resolution.round_id,
            outcome = %resolution.outcome,
            direction = %resolution.direction,
            locked_price = resolution.locked_price,
            final_price = resolution.final_price,
            points = award.points,
            "Round settled"
        );

        let summary = RoundSummary {
            resolution: resolution.clone(),
            points: award.points,
            multiplier: award.multiplier,
            streak: award.streak_after,
        };
        self.last_result = Some(summary.clone());

        self.events.emit(GameEvent::RoundResolved {
            resolution,
            points: award.points,
            multiplier: award.multiplier,
        });
        self.events.emit(GameEvent::StatsUpdated(self.store.stats().clone()));
        summary
    }

    fn persist(&self) {
        if let Some(path) = self.storage_path.as_deref() {
            if let Err(e) = storage::save_profile(&self.store.profile(), Some(path)) {
                error!(error = %e, path, "Failed to save profile");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Outcome, Phase};
    use chrono::Utc;

    fn session() -> GameSession {
        GameSession::new(SessionConfig::default(), Profile::default())
    }

    fn play(session: &mut GameSession, direction: Direction, locked: f64, last: f64) -> RoundSummary {
        session.start_round(direction, locked).unwrap();
        session.observe_price(last);
        loop {
            if let Some(summary) = session.tick().unwrap() {
                return summary;
            }
        }
    }

    fn drain(rx: &mut broadcast::Receiver<GameEvent>) -> Vec<GameEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[test]
    fn test_full_round_win() {
        let mut s = session();
        let summary = play(&mut s, Direction::Up, 245.0, 245.5);
        assert_eq!(summary.resolution.outcome, Outcome::Won);
        assert_eq!(summary.points, 100);
        assert_eq!(summary.multiplier, 1);
        assert_eq!(s.round().phase(), Phase::Won);
        assert_eq!(s.stats().wins, 1);
        assert_eq!(s.last_result(), Some(&summary));

        s.reset().unwrap();
        assert_eq!(s.round().phase(), Phase::Idle);
        assert!(s.last_result().is_none());
    }

    #[test]
    fn test_tie_counts_as_loss() {
        let mut s = session();
        let summary = play(&mut s, Direction::Up, 100.0, 100.0);
        assert_eq!(summary.resolution.outcome, Outcome::Lost);
        assert_eq!(summary.points, 0);
        assert_eq!(s.stats().losses, 1);
        assert_eq!(s.stats().total_points, 0);
    }

    #[test]
    fn test_start_while_playing_rejected_state_unchanged() {
        let mut s = session();
        let id = s.start_round(Direction::Down, 50.0).unwrap();
        s.tick().unwrap();

        let err = s.start_round(Direction::Up, 60.0).unwrap_err();
        assert!(matches!(err, ClashError::InvalidTransition { .. }));
        assert_eq!(s.round().id(), Some(id));
        assert_eq!(s.round().locked_price(), Some(50.0));
        assert_eq!(s.round().bet_direction(), Some(Direction::Down));
        assert_eq!(s.round().time_remaining(), 9);
        assert_eq!(s.stats().total_games, 0);
    }

    #[test]
    fn test_multiplier_uses_pre_round_streak() {
        let mut s = session();
        let mut points = Vec::new();
        for _ in 0..4 {
            points.push(play(&mut s, Direction::Up, 100.0, 101.0).points);
            s.reset().unwrap();
        }
        assert_eq!(points, vec![100, 100, 100, 200]);
        assert_eq!(s.stats().current_streak, 4);
        assert_eq!(s.stats().total_points, 500);
    }

    #[test]
    fn test_resolve_directly() {
        let mut s = session();
        assert!(s.resolve(10.0).is_err());
        s.start_round(Direction::Down, 10.0).unwrap();
        let summary = s.resolve(9.0).unwrap();
        assert!(summary.resolution.outcome.is_win());
        assert!(s.resolve(8.0).is_err());
        assert_eq!(s.stats().total_games, 1);
    }

    #[test]
    fn test_resolve_with_nan_settles_nothing() {
        let mut s = session();
        let mut rx = s.subscribe();
        s.start_round(Direction::Up, 10.0).unwrap();

        assert!(matches!(s.resolve(f64::NAN), Err(ClashError::InvalidPrice(_))));
        assert_eq!(s.round().phase(), Phase::Playing);
        assert_eq!(s.round().current_price(), 10.0);
        assert_eq!(s.stats().total_games, 0);
        assert!(s.last_result().is_none());
        assert!(!drain(&mut rx)
            .iter()
            .any(|e| matches!(e, GameEvent::RoundResolved { .. })));

        assert!(s.resolve(11.0).unwrap().resolution.outcome.is_win());
    }

    #[test]
    fn test_events_for_a_round() {
        let mut s = session();
        let mut rx = s.subscribe();
        play(&mut s, Direction::Up, 100.0, 99.0);
        s.reset().unwrap();

        let events = drain(&mut rx);
        assert!(matches!(events[0], GameEvent::RoundStarted { duration: 10, .. }));

        let countdowns = events
            .iter()
            .filter(|e| matches!(e, GameEvent::Countdown { .. }))
            .count();
        assert_eq!(countdowns, 9);

        let urgency: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::Urgency { remaining, .. } => Some(*remaining),
                _ => None,
            })
            .collect();
        assert_eq!(urgency, vec![4, 3, 2, 1]);

        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::RoundResolved { points: 0, .. }
        )));
        assert!(events.iter().any(|e| matches!(e, GameEvent::StatsUpdated(st) if st.losses == 1)));
        assert_eq!(events.last(), Some(&GameEvent::RoundReset));
    }

    #[test]
    fn test_urgency_carries_settings() {
        let mut s = session();
        s.toggle_setting(Setting::Sound);
        let mut rx = s.subscribe();
        play(&mut s, Direction::Up, 1.0, 2.0);

        let urgent = drain(&mut rx)
            .into_iter()
            .find(|e| matches!(e, GameEvent::Urgency { .. }))
            .unwrap();
        assert!(matches!(urgent, GameEvent::Urgency { sound: false, haptic: true, .. }));
    }

    #[test]
    fn test_settings_do_not_change_scoring() {
        let mut muted = session();
        muted.toggle_setting(Setting::Sound);
        muted.toggle_setting(Setting::Haptic);
        let mut loud = session();

        let a = play(&mut muted, Direction::Down, 10.0, 9.0);
        let b = play(&mut loud, Direction::Down, 10.0, 9.0);
        assert_eq!(a.points, b.points);
        assert_eq!(muted.stats(), loud.stats());
    }

    #[test]
    fn test_leaderboard_submission() {
        let mut s = session();
        let mut rx = s.subscribe();
        let rank = s.submit_to_leaderboard(LeaderboardEntry {
            identifier: "DeFi...King".into(),
            points: 12800,
            streak: 8,
            timestamp: Utc::now(),
        });
        assert_eq!(rank, Some(1));
        assert_eq!(s.store().leaderboard().len(), 1);
        assert_eq!(
            drain(&mut rx),
            vec![GameEvent::LeaderboardUpdated {
                identifier: "DeFi...King".into(),
                rank: Some(1),
            }]
        );
    }

    #[test]
    fn test_persists_on_outcome_and_toggle() {
        let mut path = std::env::temp_dir();
        path.push(format!("price_clash_session_{}.json", Uuid::new_v4()));
        let path = path.to_string_lossy().to_string();

        let config = SessionConfig {
            storage_path: Some(path.clone()),
            ..SessionConfig::default()
        };
        let mut s = GameSession::restore(config.clone());
        play(&mut s, Direction::Up, 100.0, 100.5);
        s.toggle_setting(Setting::Haptic);

        let restored = GameSession::restore(config);
        assert_eq!(restored.stats().wins, 1);
        assert_eq!(restored.stats().total_points, 100);
        assert!(!restored.store().settings().haptic_enabled);
        assert_eq!(restored.round().phase(), Phase::Idle);

        storage::delete_profile(Some(&path)).unwrap();
    }
}
