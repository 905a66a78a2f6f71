//! PRICE CLASH: 10-second up/down price prediction game.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores the player profile from disk (or starts fresh), starts the
//! price feed, the countdown clock and the HTTP server, and runs until
//! Ctrl+C.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use price_clash::config::{self, PriceMode};
use price_clash::engine::clock::{spawn_round_clock, TICK_PERIOD};
use price_clash::engine::TaskGuard;
use price_clash::game::events::GameEvent;
use price_clash::game::session::{GameSession, SharedSession};
use price_clash::price::cache::CachedPriceService;
use price_clash::price::feed::PriceFeed;
use price_clash::price::remote::HttpPriceSource;
use price_clash::price::synthetic::SyntheticPriceSource;
use price_clash::price::PriceSource;
use price_clash::server::{self, routes::ServerState};
use price_clash::storage;

const BANNER: &str = r#"
 ___ ___ ___ ___ ___    ___ _      _   ___ _  _
| _ \ _ \_ _/ __| __|  / __| |    /_\ / __| || |
|  _/   /| | (__| _|  | (__| |__ / _ \\__ \ __ |
|_| |_|_\___\___|___|  \___|____/_/ \_\___/_||_|

  Up or down? Ten seconds. Streaks multiply.
  v0.1.0
"#;

/// How often the main loop logs a status line.
const STATUS_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = config::AppConfig::path_from_env();
    let cfg = config::AppConfig::load(&config_path)?;

    init_logging();

    println!("{BANNER}");
    info!(
        config = %config_path,
        round_secs = cfg.game.round_duration_secs,
        price_mode = ?cfg.price.mode,
        port = cfg.server.port,
        "PRICE CLASH starting up"
    );

    // -- Restore player profile -------------------------------------------

    let session = GameSession::restore(cfg.session_config());
    info!(stats = %session.stats(), "Player profile ready");
    let observer_rx = session.subscribe();
    let session: SharedSession = session.shared();

    // -- Price plumbing -----------------------------------------------------

    let synthetic: Arc<dyn PriceSource> = {
        let walk = cfg.price.synthetic.walk_config();
        let label = cfg.price.source_label.clone();
        Arc::new(match cfg.price.synthetic.seed {
            Some(seed) => SyntheticPriceSource::seeded(walk, seed, label),
            None => SyntheticPriceSource::new(walk, label),
        })
    };
    let prices = Arc::new(CachedPriceService::new(synthetic, cfg.price.cache_ttl()));

    let feed_source: Arc<dyn PriceSource> = match (cfg.price.mode, cfg.price.remote_url.as_deref()) {
        (PriceMode::Remote, Some(url)) => {
            let remote = HttpPriceSource::new(url, cfg.price.request_timeout())?;
            info!(url = remote.url(), "Reading prices from remote server");
            Arc::new(remote)
        }
        _ => prices.clone(),
    };
    let feed = Arc::new(PriceFeed::new(feed_source, cfg.price.failure_threshold));

    // -- Background tasks (aborted when the guards drop) --------------------

    let mut tasks: Vec<TaskGuard> = vec![
        feed.spawn(cfg.price.poll_interval()),
        spawn_round_clock(session.clone(), feed.clone(), TICK_PERIOD),
        TaskGuard::spawn("event-log", log_events(observer_rx)),
    ];

    if cfg.server.enabled {
        let state = Arc::new(ServerState {
            session: session.clone(),
            feed: feed.clone(),
            prices,
        });
        tasks.push(server::spawn_server(state, cfg.server.port).await?);
    } else {
        warn!("HTTP server disabled; the game can only be driven in-process");
    }

    // -- Main loop -------------------------------------------------------

    let mut status = tokio::time::interval(STATUS_INTERVAL);
    status.tick().await;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let task_names: Vec<&str> = tasks.iter().map(TaskGuard::name).collect();
    info!(tasks = ?task_names, "Running. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            _ = status.tick() => {
                let feed = feed.status().await;
                let s = session.read().await;
                info!(
                    price = feed.price,
                    live = feed.is_live,
                    phase = %s.round().phase(),
                    stats = %s.stats(),
                    "Status"
                );
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    drop(tasks);

    // Save final profile
    let session = session.read().await;
    if let Some(path) = cfg.session_config().storage_path.as_deref() {
        storage::save_profile(&session.store().profile(), Some(path))?;
    }
    info!(stats = %session.stats(), "PRICE CLASH shut down cleanly.");

    Ok(())
}

/// Log the event stream. Stands in for the sound/haptic channel: urgency
/// ticks are only reported when the matching output is enabled.
async fn log_events(mut rx: tokio::sync::broadcast::Receiver<GameEvent>) {
    loop {
        match rx.recv().await {
            Ok(GameEvent::Urgency { remaining, sound, haptic, .. }) => {
                if sound || haptic {
                    info!(remaining, sound, haptic, "Tick");
                }
            }
            Ok(GameEvent::RoundResolved { resolution, points, multiplier }) => {
                info!(
                    outcome = %resolution.outcome,
                    points,
                    multiplier,
                    price_move = %format_args!("{:+.2}", resolution.price_move()),
                    "Result"
                );
            }
            Ok(event) => debug!(?event, "Game event"),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event observer lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("price_clash=info"));

    let json_logging = std::env::var("CLASH_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
