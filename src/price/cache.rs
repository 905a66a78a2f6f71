//! Result cache in front of a price source.
//!
//! Backs `GET /price`: within the TTL every caller gets the same quote,
//! relabelled `source: "cache"`, and the upstream is not touched.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{PriceResponse, PriceSource};
use crate::types::PriceQuote;

/// Default cache lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_millis(1000);

pub struct CachedPriceService {
    source: Arc<dyn PriceSource>,
    ttl: Duration,
    cached: Mutex<Option<(PriceQuote, Instant)>>,
}

impl CachedPriceService {
    pub fn new(source: Arc<dyn PriceSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            cached: Mutex::new(None),
        }
    }

    /// Current quote, served from cache when fresh.
    pub async fn quote(&self) -> Result<PriceQuote> {
        // Held across the fetch so concurrent misses hit upstream once.
        let mut cached = self.cached.lock().await;

        if let Some((quote, at)) = cached.as_ref() {
            if at.elapsed() < self.ttl {
                return Ok(PriceQuote {
                    source: "cache".to_string(),
                    ..quote.clone()
                });
            }
        }

        let quote = self.source.fetch().await?;
        debug!(price = quote.price, change24h = quote.change24h, "Price refreshed");
        *cached = Some((quote.clone(), Instant::now()));
        Ok(quote)
    }

    /// Quote as the `GET /price` wire body. Never fails; errors become
    /// `success: false`.
    pub async fn response(&self) -> PriceResponse {
        match self.quote().await {
            Ok(quote) => PriceResponse::ok(quote),
            Err(e) => {
                warn!(error = %e, "Price source failed");
                PriceResponse::failed(e.to_string())
            }
        }
    }
}

#[async_trait]
impl PriceSource for CachedPriceService {
    async fn fetch(&self) -> Result<PriceQuote> {
        self.quote().await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
