//! Countdown clock.
//!
//! Once per period: copy the feed's latest price into the session and,
//! if a round is running, tick it. Placing a bet restarts the period.
//! All session mutations happen under the session write lock, one
//! callback at a time.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::TaskGuard;
use crate::game::events::GameEvent;
use crate::game::session::{RoundSummary, SharedSession};
use crate::price::feed::PriceFeed;
use crate::types::Phase;

/// Countdown resolution.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// One clock callback. Returns the summary if this tick resolved a round.
pub async fn drive_once(session: &SharedSession, feed: &PriceFeed) -> Option<RoundSummary> {
    let price = feed.current_price().await;
    let mut session = session.write().await;
    session.observe_price(price);

    if session.round().phase() != Phase::Playing {
        return None;
    }

    match session.tick() {
        Ok(Some(summary)) => {
            info!(
                outcome = %summary.resolution.outcome,
                points = summary.points,
                streak = summary.streak,
                "Round complete"
            );
            Some(summary)
        }
        Ok(None) => None,
        Err(e) => {
            warn!(error = %e, "Clock tick rejected");
            None
        }
    }
}

/// Run `drive_once` every `period` until the guard drops. The countdown
/// is re-armed whenever a round starts, so the first tick of a round lands
/// one full period after the bet.
pub fn spawn_round_clock(session: SharedSession, feed: Arc<PriceFeed>, period: Duration) -> TaskGuard {
    TaskGuard::spawn("round-clock", async move {
        let mut events = session.read().await.subscribe();
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                event = events.recv() => match event {
                    Ok(GameEvent::RoundStarted { round_id, .. }) => {
                        debug!(round = %round_id, "Countdown re-armed");
                        interval.reset();
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Round clock lagged behind game events");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = interval.tick() => {
                    if round_just_started(&mut events) {
                        interval.reset();
                        continue;
                    }
                    drive_once(&session, &feed).await;
                }
            }
        }
    })
}

/// Drain pending events; true if a round started since the last poll.
fn round_just_started(events: &mut broadcast::Receiver<GameEvent>) -> bool {
    let mut started = false;
    loop {
        match events.try_recv() {
            Ok(GameEvent::RoundStarted { .. }) => started = true,
            Ok(_) | Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return started,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
