use std::time::Duration;

use config::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::risk::RiskParams;
use crate::{BotError, Result};

const CONFIG_FILE: &str = "spreadbot";
const ENV_PREFIX: &str = "SPREADBOT";

/// Deploy-time configuration, loaded once at startup
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub symbol: String,
    pub tick_interval_ms: u64,
    pub stop_loss_percent: Decimal,
    pub take_profit_percent: Decimal,
    /// Fraction of buying power per order
    pub position_size: Decimal,
    pub feed_url: String,
    pub trading_url: String,
    pub data_url: String,
    pub requests_per_minute: u32,
    #[serde(default)]
    pub api_key_id: String,
    #[serde(default)]
    pub api_secret_key: String,
}

impl BotConfig {
    /// Defaults, then `spreadbot.toml` if present, then `SPREADBOT_*` env vars.
    /// Brokerage credentials are read from `APCA_API_KEY_ID` / `APCA_API_SECRET_KEY`.
    pub fn load() -> Result<Self> {
        let mut builder = Self::defaults()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX));

        if let Ok(key_id) = std::env::var("APCA_API_KEY_ID") {
            builder = builder.set_override("api_key_id", key_id)?;
        }
        if let Ok(secret) = std::env::var("APCA_API_SECRET_KEY") {
            builder = builder.set_override("api_secret_key", secret)?;
        }

        let config: BotConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(Config::builder()
            .set_default("symbol", "BTC/USD")?
            .set_default("tick_interval_ms", 100)?
            .set_default("stop_loss_percent", "0.5")?
            .set_default("take_profit_percent", "1.0")?
            .set_default("position_size", "0.01")?
            .set_default("feed_url", "ws://localhost:50051")?
            .set_default("trading_url", "https://paper-api.alpaca.markets")?
            .set_default("data_url", "https://data.alpaca.markets")?
            .set_default("requests_per_minute", 200)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(BotError::Config("symbol must not be empty".to_string()));
        }
        if self.tick_interval_ms == 0 {
            return Err(BotError::Config(
                "tick_interval_ms must be positive".to_string(),
            ));
        }
        if self.requests_per_minute == 0 {
            return Err(BotError::Config(
                "requests_per_minute must be positive".to_string(),
            ));
        }
        if self.api_key_id.is_empty() || self.api_secret_key.is_empty() {
            return Err(BotError::Config(
                "APCA_API_KEY_ID and APCA_API_SECRET_KEY must be set".to_string(),
            ));
        }
        self.risk_params().validate()
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn risk_params(&self) -> RiskParams {
        RiskParams {
            position_size_fraction: self.position_size,
            take_profit_percent: self.take_profit_percent,
            stop_loss_percent: self.stop_loss_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> BotConfig {
        BotConfig::defaults()
            .unwrap()
            .set_override("api_key_id", "key")
            .unwrap()
            .set_override("api_secret_key", "secret")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_match_deployed_constants() {
        let config = default_config();

        assert_eq!(config.symbol, "BTC/USD");
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
        assert_eq!(config.risk_params(), RiskParams::default());
        assert_eq!(config.requests_per_minute, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let config = BotConfig {
            api_secret_key: String::new(),
            ..default_config()
        };

        assert!(matches!(config.validate(), Err(BotError::Config(_))));
    }

    #[test]
    fn test_invalid_risk_params_rejected() {
        let config = BotConfig {
            position_size: Decimal::ZERO,
            ..default_config()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_tick_interval_rejected() {
        let config = BotConfig {
            tick_interval_ms: 0,
            ..default_config()
        };

        assert!(config.validate().is_err());
    }
}
