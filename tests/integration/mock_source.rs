//! Scripted price source for integration testing.
//!
//! Returns a queue of prices (or failures) in order, then repeats the
//! last scripted price. All state is in-memory and controllable from
//! test code.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use price_clash::price::PriceSource;
use price_clash::types::PriceQuote;

/// One scripted poll result. `None` is a failed fetch.
pub type Step = Option<f64>;

pub struct ScriptedSource {
    steps: Arc<Mutex<VecDeque<Step>>>,
    last_price: Arc<Mutex<Option<f64>>>,
    /// If set, every fetch fails with this message.
    force_error: Arc<Mutex<Option<String>>>,
    calls: Arc<Mutex<u32>>,
}

impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into_iter().collect())),
            last_price: Arc::new(Mutex::new(None)),
            force_error: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// A source that always returns `price`.
    pub fn fixed(price: f64) -> Self {
        Self::new([Some(price)])
    }

    pub fn push(&self, step: Step) {
        self.steps.lock().unwrap().push_back(step);
    }

    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl PriceSource for ScriptedSource {
    async fn fetch(&self) -> Result<PriceQuote> {
        *self.calls.lock().unwrap() += 1;

        if let Some(msg) = self.force_error.lock().unwrap().clone() {
            return Err(anyhow!(msg));
        }

        let step = self.steps.lock().unwrap().pop_front();
        let price = match step {
            Some(Some(price)) => {
                *self.last_price.lock().unwrap() = Some(price);
                price
            }
            Some(None) => return Err(anyhow!("scripted failure")),
            None => self
                .last_price
                .lock()
                .unwrap()
                .ok_or_else(|| anyhow!("script exhausted"))?,
        };

        Ok(PriceQuote {
            price,
            change24h: 0.0,
            timestamp: chrono::Utc::now().timestamp_millis(),
            source: "scripted".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_plays_in_order_then_repeats() {
        let source = ScriptedSource::new([Some(1.0), None, Some(2.0)]);
        assert_eq!(source.fetch().await.unwrap().price, 1.0);
        assert!(source.fetch().await.is_err());
        assert_eq!(source.fetch().await.unwrap().price, 2.0);
        assert_eq!(source.fetch().await.unwrap().price, 2.0);
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test]
    async fn test_forced_error_overrides_script() {
        let source = ScriptedSource::fixed(5.0);
        source.set_error("offline");
        let err = source.fetch().await.unwrap_err();
        assert!(err.to_string().contains("offline"));
        source.clear_error();
        assert_eq!(source.fetch().await.unwrap().price, 5.0);
    }

    #[tokio::test]
    async fn test_empty_script_fails() {
        let source = ScriptedSource::new([]);
        assert!(source.fetch().await.is_err());
    }
}
