//! Price sources.
//!
//! Defines the `PriceSource` trait and the pieces built on it:
//! - `synthetic`: bounded mean-reverting random walk with jumps
//! - `cache`: short-lived result cache backing `GET /price`
//! - `remote`: HTTP client for another server's `GET /price`
//! - `feed`: polling client with the disconnect rule the game reads from

pub mod cache;
pub mod feed;
pub mod remote;
pub mod synthetic;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::PriceQuote;

/// Abstraction over anything that can produce a current price.
///
/// The game treats this purely as an oracle: no accuracy or latency
/// contract beyond eventually returning a number.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch(&self) -> Result<PriceQuote>;
}

/// Wire body of `GET /price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change24h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PriceResponse {
    pub fn ok(quote: PriceQuote) -> Self {
        Self {
            success: true,
            price: Some(quote.price),
            change24h: Some(quote.change24h),
            timestamp: Some(quote.timestamp),
            source: Some(quote.source),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            price: None,
            change24h: None,
            timestamp: None,
            source: None,
            error: Some(error.into()),
        }
    }

    /// Convert back into a quote, treating `success: false` or a missing
    /// price as an error.
    pub fn into_quote(self) -> Result<PriceQuote> {
        if !self.success {
            anyhow::bail!(
                "Price API error: {}",
                self.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }
        let price = self
            .price
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| anyhow::anyhow!("Price API returned no usable price"))?;

        Ok(PriceQuote {
            price,
            change24h: self.change24h.unwrap_or(0.0),
            timestamp: self
                .timestamp
                .unwrap_or_else(|| chrono::Utc::now().timestamp_millis()),
            source: self.source.unwrap_or_else(|| "unknown".to_string()),
        })
    }
}

/// Round to cents.
pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
