//! Remote price source.
//!
//! Reads another server's `GET /price` endpoint.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{PriceResponse, PriceSource};
use crate::types::PriceQuote;

pub struct HttpPriceSource {
    http: Client,
    url: String,
}

impl HttpPriceSource {
    /// `base_url` is the server root, e.g. `http://localhost:3000`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("PRICE-CLASH/0.1.0")
            .build()
            .context("Failed to build price HTTP client")?;
        Ok(Self {
            http,
            url: format!("{}/price", base_url.trim_end_matches('/')),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    async fn fetch(&self) -> Result<PriceQuote> {
        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .context(format!("Price request failed: {}", self.url))?;

        let status = resp.status();
        let body: PriceResponse = resp
            .json()
            .await
            .context(format!("Failed to parse price response ({status})"))?;

        if !status.is_success() && body.success {
            anyhow::bail!("Price API error: {status}");
        }
        body.into_quote()
    }
}
