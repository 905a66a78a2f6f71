//! Game events broadcast to observers.
//!
//! Sound, haptics, logging and any front end subscribe here. Emission is
//! fire-and-forget: a lagging or absent subscriber never affects the game.

use tokio::sync::broadcast;
use uuid::Uuid;

use super::round::Resolution;
use crate::store::stats::Stats;
use crate::types::{Direction, Setting};

/// Buffered events per subscriber before the oldest are dropped.
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    RoundStarted {
        round_id: Uuid,
        direction: Direction,
        locked_price: f64,
        duration: u32,
    },
    Countdown {
        round_id: Uuid,
        remaining: u32,
    },
    /// Advisory signal for the last seconds of a round. Carries the output
    /// preferences so observers need not query the store.
    Urgency {
        round_id: Uuid,
        remaining: u32,
        sound: bool,
        haptic: bool,
    },
    RoundResolved {
        resolution: Resolution,
        points: u64,
        multiplier: u64,
    },
    RoundReset,
    StatsUpdated(Stats),
    LeaderboardUpdated {
        identifier: String,
        rank: Option<usize>,
    },
    SettingChanged {
        setting: Setting,
        enabled: bool,
    },
}

/// Publish side of the event channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<GameEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }
}

impl EventBus {
    pub fn emit(&self, event: GameEvent) {
        // Err only means nobody is listening.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.tx.subscribe()
    }
}
