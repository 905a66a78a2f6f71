//! Polling price feed.
//!
//! Polls a `PriceSource` at a fixed interval and keeps the latest quote.
//! A single failed poll is absorbed silently; only after
//! `failure_threshold` consecutive failures does the feed report itself
//! disconnected. The last good price is kept either way.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::PriceSource;
use crate::engine::TaskGuard;
use crate::types::PriceQuote;

/// Default consecutive-failure count before reporting disconnected.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Default poll period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Default)]
struct FeedState {
    last_quote: Option<PriceQuote>,
    connected: bool,
    consecutive_failures: u32,
    last_error: Option<String>,
}

/// Snapshot of the feed for display.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedStatus {
    pub price: f64,
    pub change24h: f64,
    pub timestamp: Option<i64>,
    pub source: Option<String>,
    pub is_live: bool,
    pub consecutive_failures: u32,
    pub error: Option<String>,
}

pub struct PriceFeed {
    source: Arc<dyn PriceSource>,
    failure_threshold: u32,
    state: RwLock<FeedState>,
}

impl PriceFeed {
    pub fn new(source: Arc<dyn PriceSource>, failure_threshold: u32) -> Self {
        Self {
            source,
            failure_threshold: failure_threshold.max(1),
            state: RwLock::new(FeedState::default()),
        }
    }

    /// Latest price, 0.0 before the first successful poll.
    pub async fn current_price(&self) -> f64 {
        self.state
            .read()
            .await
            .last_quote
            .as_ref()
            .map(|q| q.price)
            .unwrap_or(0.0)
    }

    pub async fn change_24h(&self) -> f64 {
        self.state
            .read()
            .await
            .last_quote
            .as_ref()
            .map(|q| q.change24h)
            .unwrap_or(0.0)
    }

    pub async fn is_live(&self) -> bool {
        self.state.read().await.connected
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    pub async fn status(&self) -> FeedStatus {
        let s = self.state.read().await;
        FeedStatus {
            price: s.last_quote.as_ref().map(|q| q.price).unwrap_or(0.0),
            change24h: s.last_quote.as_ref().map(|q| q.change24h).unwrap_or(0.0),
            timestamp: s.last_quote.as_ref().map(|q| q.timestamp),
            source: s.last_quote.as_ref().map(|q| q.source.clone()),
            is_live: s.connected,
            consecutive_failures: s.consecutive_failures,
            error: s.last_error.clone(),
        }
    }

    /// Poll the source once. Returns whether the poll succeeded.
    pub async fn poll_once(&self) -> bool {
        let result = self.source.fetch().await;
        let mut s = self.state.write().await;

        match result {
            Ok(quote) => {
                if !s.connected {
                    info!(price = quote.price, source = %quote.source, "Price feed connected");
                }
                debug!(price = quote.price, source = %quote.source, "Price polled");
                s.last_quote = Some(quote);
                s.connected = true;
                s.consecutive_failures = 0;
                s.last_error = None;
                true
            }
            Err(e) => {
                s.consecutive_failures = s.consecutive_failures.saturating_add(1);
                debug!(error = %e, failures = s.consecutive_failures, "Price poll failed");

                if s.consecutive_failures >= self.failure_threshold {
                    if s.connected {
                        warn!(
                            error = %e,
                            failures = s.consecutive_failures,
                            "Price feed disconnected"
                        );
                    }
                    s.connected = false;
                    s.last_error = Some(format!("Failed to fetch price: {e}"));
                }
                false
            }
        }
    }

    /// Poll immediately and then every `period` until the guard drops.
    pub fn spawn(self: &Arc<Self>, period: Duration) -> TaskGuard {
        let feed = Arc::clone(self);
        TaskGuard::spawn("price-feed", async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                feed.poll_once().await;
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
