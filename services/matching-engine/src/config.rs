//! Engine configuration
//!
//! Loaded from JSON; every field has a default so a partial file is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use types::ids::MarketId;
use types::numeric::Precision;

/// rust_decimal holds at most 28 fractional digits; funds need price + amount.
const MAX_FUNDS_PRECISION: u32 = 28;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// One tradable pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    pub base: String,
    pub quote: String,
    #[serde(default = "default_price_precision")]
    pub price_precision: u32,
    #[serde(default = "default_amount_precision")]
    pub amount_precision: u32,
}

impl MarketConfig {
    pub fn new(base: impl Into<String>, quote: impl Into<String>, precision: Precision) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
            price_precision: precision.price,
            amount_precision: precision.amount,
        }
    }

    pub fn market_id(&self) -> MarketId {
        MarketId::from_pair(&self.base, &self.quote)
    }

    pub fn precision(&self) -> Precision {
        Precision::new(self.price_precision, self.amount_precision)
    }
}

fn default_price_precision() -> u32 {
    Precision::default().price
}

fn default_amount_precision() -> u32 {
    Precision::default().amount
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bounded mailbox depth per market
    pub mailbox_capacity: usize,
    /// Price levels per side in published snapshots (0 = all)
    pub snapshot_depth: usize,
    /// Allowed quote assets, highest rank first
    pub quote_assets: Vec<String>,
    pub markets: Vec<MarketConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 8192,
            snapshot_depth: 50,
            quote_assets: vec!["USDT".to_string(), "BTC".to_string()],
            markets: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mailbox_capacity == 0 {
            return Err(ConfigError::Invalid("mailbox_capacity must be positive".to_string()));
        }
        if self.quote_assets.is_empty() {
            return Err(ConfigError::Invalid("quote_assets must not be empty".to_string()));
        }
        for market in &self.markets {
            if market.base.is_empty() || market.quote.is_empty() || market.base == market.quote {
                return Err(ConfigError::Invalid(format!(
                    "invalid pair {}/{}",
                    market.base, market.quote
                )));
            }
            if market.precision().funds() > MAX_FUNDS_PRECISION {
                return Err(ConfigError::Invalid(format!(
                    "precision of {} exceeds {} decimal places",
                    market.market_id(),
                    MAX_FUNDS_PRECISION
                )));
            }
        }
        Ok(())
    }

    /// Whether `quote` may quote `base`
    ///
    /// The quote must be an allowed quote asset, and a base that is itself a
    /// higher-ranked quote asset is refused (USDT is never priced in BTC).
    pub fn pair_allowed(&self, base: &str, quote: &str) -> bool {
        let rank = |asset: &str| self.quote_assets.iter().position(|a| a == asset);
        match (rank(quote), rank(base)) {
            (None, _) => false,
            (Some(quote_rank), Some(base_rank)) => base_rank > quote_rank,
            (Some(_), None) => base != quote,
        }
    }
}
