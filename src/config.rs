//! Configuration loading from TOML.
//!
//! Reads `config.toml` (or the file named by `CLASH_CONFIG`) and
//! deserializes into strongly-typed structs. Every section has defaults
//! so a partial file is enough.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::game::round::ROUND_DURATION_SECS;
use crate::game::session::SessionConfig;
use crate::price::feed::DEFAULT_FAILURE_THRESHOLD;
use crate::price::synthetic::WalkConfig;
use crate::storage::DEFAULT_STATE_FILE;
use crate::store::leaderboard::DEFAULT_CAPACITY;

/// Default config path.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub game: GameConfig,
    pub price: PriceConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GameConfig {
    pub round_duration_secs: u32,
    pub leaderboard_size: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round_duration_secs: ROUND_DURATION_SECS,
            leaderboard_size: DEFAULT_CAPACITY,
        }
    }
}

/// Where the game's price feed reads from.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PriceMode {
    /// This process's own `/price` service (synthetic generator).
    #[default]
    Local,
    /// Another server's `/price` endpoint.
    Remote,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PriceConfig {
    pub mode: PriceMode,
    /// Base URL for `mode = "remote"`.
    pub remote_url: Option<String>,
    pub poll_interval_ms: u64,
    pub cache_ttl_ms: u64,
    pub request_timeout_ms: u64,
    pub failure_threshold: u32,
    /// Label reported in `/price` responses for freshly generated quotes.
    pub source_label: String,
    pub synthetic: SyntheticConfig,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            mode: PriceMode::Local,
            remote_url: None,
            poll_interval_ms: 1500,
            cache_ttl_ms: 1000,
            request_timeout_ms: 5000,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            source_label: "live".to_string(),
            synthetic: SyntheticConfig::default(),
        }
    }
}

impl PriceConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SyntheticConfig {
    pub mean_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub volatility: f64,
    pub mean_reversion: f64,
    pub jump_probability: f64,
    /// Fixed RNG seed; OS entropy when unset.
    pub seed: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        let walk = WalkConfig::default();
        Self {
            mean_price: walk.mean_price,
            min_price: walk.min_price,
            max_price: walk.max_price,
            volatility: walk.volatility,
            mean_reversion: walk.mean_reversion,
            jump_probability: walk.jump_probability,
            seed: None,
        }
    }
}

impl SyntheticConfig {
    pub fn walk_config(&self) -> WalkConfig {
        let base = WalkConfig::default();
        // Keep the start window around the configured mean.
        let start_range = (self.mean_price - 1.0, self.mean_price + 3.0);
        WalkConfig {
            mean_price: self.mean_price,
            min_price: self.min_price,
            max_price: self.max_price,
            volatility: self.volatility,
            mean_reversion: self.mean_reversion,
            jump_probability: self.jump_probability,
            start_range,
            ..base
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 3000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub state_file: String,
    /// Disable to keep the profile in memory only.
    pub persist: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: DEFAULT_STATE_FILE.to_string(),
            persist: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Path from `CLASH_CONFIG`, else the default.
    pub fn path_from_env() -> String {
        std::env::var("CLASH_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string())
    }

    fn validate(&self) -> Result<()> {
        if self.game.round_duration_secs == 0 {
            anyhow::bail!("game.round_duration_secs must be at least 1");
        }
        if self.game.leaderboard_size == 0 {
            anyhow::bail!("game.leaderboard_size must be at least 1");
        }
        let syn = &self.price.synthetic;
        if !(syn.min_price > 0.0 && syn.min_price <= syn.mean_price && syn.mean_price <= syn.max_price) {
            anyhow::bail!(
                "price.synthetic requires 0 < min_price <= mean_price <= max_price (got {} / {} / {})",
                syn.min_price,
                syn.mean_price,
                syn.max_price
            );
        }
        if self.price.mode == PriceMode::Remote && self.price.remote_url.is_none() {
            anyhow::bail!("price.remote_url is required when price.mode = \"remote\"");
        }
        Ok(())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            round_duration: self.game.round_duration_secs,
            leaderboard_capacity: self.game.leaderboard_size,
            storage_path: self
                .storage
                .persist
                .then(|| self.storage.state_file.clone()),
        }
    }
}
