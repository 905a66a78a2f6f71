//! End-to-end game flow: feed → clock → session → store → disk.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast::Receiver;
use uuid::Uuid;

use price_clash::engine::clock::{spawn_round_clock, TICK_PERIOD};
use price_clash::game::events::GameEvent;
use price_clash::game::session::{GameSession, SessionConfig};
use price_clash::price::cache::CachedPriceService;
use price_clash::price::feed::PriceFeed;
use price_clash::price::synthetic::{SyntheticPriceSource, WalkConfig};
use price_clash::storage;
use price_clash::store::leaderboard::LeaderboardEntry;
use price_clash::store::Profile;
use price_clash::types::{Direction, Outcome, Phase, Setting};

use crate::mock_source::ScriptedSource;

fn temp_state_path() -> String {
    std::env::temp_dir()
        .join(format!("price_clash_it_{}.json", Uuid::new_v4()))
        .to_string_lossy()
        .into_owned()
}

fn session_at(path: Option<&str>) -> GameSession {
    GameSession::restore(SessionConfig {
        storage_path: path.map(str::to_string),
        ..SessionConfig::default()
    })
}

fn drain(rx: &mut Receiver<GameEvent>) -> Vec<GameEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn play(session: &mut GameSession, direction: Direction, locked: f64, fin: f64) -> Outcome {
    session.start_round(direction, locked).unwrap();
    let summary = session.resolve(fin).unwrap();
    session.reset().unwrap();
    summary.resolution.outcome
}

#[tokio::test(start_paused = true)]
async fn test_clock_plays_full_round_against_feed() {
    let source = Arc::new(ScriptedSource::new([Some(245.00), Some(245.80)]));
    let feed = Arc::new(PriceFeed::new(source.clone(), 3));
    assert!(feed.poll_once().await);

    let session = session_at(None);
    let mut rx = session.subscribe();
    let session = session.shared();

    let locked = feed.current_price().await;
    session.write().await.start_round(Direction::Up, locked).unwrap();

    // Price moves up after the bet.
    assert!(feed.poll_once().await);

    let _clock = spawn_round_clock(session.clone(), feed.clone(), TICK_PERIOD);

    tokio::time::sleep(Duration::from_millis(5_500)).await;
    {
        let s = session.read().await;
        assert_eq!(s.round().phase(), Phase::Playing);
        assert_eq!(s.round().time_remaining(), 5);
        assert_eq!(s.round().is_winning(), Some(true));
    }

    tokio::time::sleep(Duration::from_secs(5)).await;
    let s = session.read().await;
    assert_eq!(s.round().phase(), Phase::Won);
    assert_eq!(s.round().time_remaining(), 0);
    let result = s.last_result().unwrap();
    assert_eq!(result.resolution.final_price, 245.80);
    assert_eq!(result.points, 100);
    assert_eq!(s.stats().wins, 1);
    assert_eq!(s.stats().total_points, 100);

    let events = drain(&mut rx);
    let countdowns = events
        .iter()
        .filter(|e| matches!(e, GameEvent::Countdown { .. }))
        .count();
    let urgent: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::Urgency { remaining, .. } => Some(*remaining),
            _ => None,
        })
        .collect();
    assert!(matches!(events.first(), Some(GameEvent::RoundStarted { .. })));
    assert_eq!(countdowns, 9);
    assert_eq!(urgent, vec![4, 3, 2, 1]);
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::RoundResolved { points: 100, .. })));
}

#[tokio::test(start_paused = true)]
async fn test_clock_idles_without_round() {
    let feed = Arc::new(PriceFeed::new(Arc::new(ScriptedSource::fixed(250.0)), 3));
    feed.poll_once().await;
    let session = session_at(None).shared();

    let _clock = spawn_round_clock(session.clone(), feed.clone(), TICK_PERIOD);
    tokio::time::sleep(Duration::from_millis(3_500)).await;

    let s = session.read().await;
    assert_eq!(s.round().phase(), Phase::Idle);
    assert_eq!(s.round().current_price(), 250.0);
    assert_eq!(s.stats().total_games, 0);
}

#[tokio::test]
async fn test_streak_multiplier_progression() {
    let mut session = session_at(None);

    for _ in 0..3 {
        assert_eq!(play(&mut session, Direction::Up, 100.0, 101.0), Outcome::Won);
    }
    assert_eq!(session.stats().total_points, 300);
    assert_eq!(session.stats().next_multiplier(), 2);

    // Fourth win pays double: multiplier comes from the streak before it.
    assert_eq!(play(&mut session, Direction::Down, 100.0, 99.0), Outcome::Won);
    assert_eq!(session.stats().total_points, 500);
    assert_eq!(session.stats().current_streak, 4);

    // A tie loses and breaks the streak.
    assert_eq!(play(&mut session, Direction::Up, 100.0, 100.0), Outcome::Lost);
    let stats = session.stats();
    assert_eq!(stats.current_streak, 0);
    assert_eq!(stats.best_streak, 4);
    assert_eq!(stats.total_points, 500);
    assert_eq!(stats.total_games, stats.wins + stats.losses);
    assert!(stats.is_consistent());
}

#[tokio::test]
async fn test_double_bet_rejected_until_reset() {
    let mut session = session_at(None);
    session.start_round(Direction::Up, 245.0).unwrap();
    assert!(session.start_round(Direction::Down, 245.0).is_err());

    session.resolve(244.0).unwrap();
    assert_eq!(session.round().phase(), Phase::Lost);
    assert!(session.start_round(Direction::Up, 245.0).is_err());

    session.reset().unwrap();
    assert!(session.start_round(Direction::Up, 245.0).is_ok());
}

#[tokio::test]
async fn test_feed_disconnects_after_three_failures_and_recovers() {
    let source = Arc::new(ScriptedSource::new([
        Some(245.0),
        None,
        None,
        None,
        Some(247.5),
    ]));
    let feed = PriceFeed::new(source.clone(), 3);

    assert!(feed.poll_once().await);
    assert!(feed.is_live().await);

    assert!(!feed.poll_once().await);
    assert!(!feed.poll_once().await);
    assert!(feed.is_live().await);
    assert!(feed.last_error().await.is_none());

    assert!(!feed.poll_once().await);
    assert!(!feed.is_live().await);
    assert!(feed.last_error().await.is_some());
    // Last good price is kept.
    assert_eq!(feed.current_price().await, 245.0);

    assert!(feed.poll_once().await);
    assert!(feed.is_live().await);
    assert_eq!(feed.current_price().await, 247.5);
    assert_eq!(feed.status().await.consecutive_failures, 0);
    assert_eq!(source.calls(), 5);
}

#[tokio::test]
async fn test_synthetic_prices_flow_through_cache_and_feed() {
    let synthetic = Arc::new(SyntheticPriceSource::seeded(WalkConfig::default(), 7, "live"));
    let prices = Arc::new(CachedPriceService::new(synthetic, Duration::from_millis(1_000)));
    let feed = PriceFeed::new(prices.clone(), 3);

    assert!(feed.poll_once().await);
    let first = feed.current_price().await;
    assert!((220.0..=280.0).contains(&first));
    assert_eq!(feed.status().await.source.as_deref(), Some("live"));

    // Within the TTL the cache answers with the same price.
    let response = prices.response().await;
    assert!(response.success);
    assert_eq!(response.price, Some(first));
    assert_eq!(response.source.as_deref(), Some("cache"));
}

#[tokio::test]
async fn test_profile_survives_restart() {
    let path = temp_state_path();

    {
        let mut session = session_at(Some(&path));
        play(&mut session, Direction::Up, 10.0, 11.0);
        play(&mut session, Direction::Up, 10.0, 9.0);
        assert!(!session.toggle_setting(Setting::Sound));
        session.submit_to_leaderboard(LeaderboardEntry {
            identifier: "7xKp...9fQe".to_string(),
            points: 100,
            streak: 1,
            timestamp: Utc::now(),
        });
    }

    let restored = session_at(Some(&path));
    let stats = restored.stats();
    assert_eq!(stats.total_games, 2);
    assert_eq!(stats.wins, 1);
    assert_eq!(stats.losses, 1);
    assert_eq!(stats.best_streak, 1);
    assert_eq!(stats.total_points, 100);
    let settings = restored.store().settings();
    assert!(!settings.sound_enabled);
    assert!(settings.haptic_enabled);
    // The leaderboard is not part of the persisted profile.
    assert!(restored.store().leaderboard().is_empty());
    assert_eq!(restored.round().phase(), Phase::Idle);

    storage::delete_profile(Some(&path)).unwrap();
}

#[tokio::test]
async fn test_corrupt_state_file_falls_back_to_defaults() {
    let path = temp_state_path();
    std::fs::write(&path, "{ not json").unwrap();

    let session = session_at(Some(&path));
    assert_eq!(session.store().profile(), Profile::default());

    // The next mutation overwrites the corrupt file with a valid one.
    let mut session = session;
    session.toggle_setting(Setting::Haptic);
    let saved = storage::read_profile(Some(&path)).unwrap().unwrap();
    assert!(!saved.haptic_enabled);
    assert!(saved.sound_enabled);

    storage::delete_profile(Some(&path)).unwrap();
}

#[tokio::test]
async fn test_urgency_events_carry_current_settings() {
    let mut session = session_at(None);
    session.toggle_setting(Setting::Sound);
    let mut rx = session.subscribe();

    session.start_round(Direction::Down, 245.0).unwrap();
    session.observe_price(244.0);
    let mut resolved = None;
    for _ in 0..10 {
        if let Some(summary) = session.tick().unwrap() {
            resolved = Some(summary);
        }
    }
    assert_eq!(resolved.unwrap().resolution.outcome, Outcome::Won);

    let urgency: Vec<(bool, bool)> = drain(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            GameEvent::Urgency { sound, haptic, .. } => Some((sound, haptic)),
            _ => None,
        })
        .collect();
    assert_eq!(urgency, vec![(false, true); 4]);
}
