//! Environment-driven configuration
//!
//! `main.rs` loads `.env` through dotenvy first, then calls
//! [`AppConfig::from_env`]. Tests build [`CoreSettings::default`] directly.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::services::deal_price::OriginalPricePolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Tunables for the ledger services.
#[derive(Debug, Clone)]
pub struct CoreSettings {
    /// Percentage drop from a tracker's initial price that fires an alert
    pub price_drop_alert_percent: Decimal,
    /// How many recent entries feed the trend computation
    pub trend_window: u64,
    /// Gap kept between original and current price when repairing
    pub price_epsilon: Decimal,
    pub original_price_policy: OriginalPricePolicy,
    /// Attempts at inserting a price entry before surfacing `Conflict`
    pub max_timestamp_retries: u32,
    pub operation_timeout: Duration,
    pub balance_cache_ttl: Duration,
    pub balance_cache_capacity: u64,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            price_drop_alert_percent: dec!(10),
            trend_window: 10,
            price_epsilon: dec!(0.01),
            original_price_policy: OriginalPricePolicy::Repair,
            max_timestamp_retries: 5,
            operation_timeout: Duration::from_millis(5000),
            balance_cache_ttl: Duration::from_secs(30),
            balance_cache_capacity: 10_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub settings: CoreSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());

        let defaults = CoreSettings::default();
        let settings = CoreSettings {
            price_drop_alert_percent: parse_or(
                &lookup,
                "PRICE_DROP_ALERT_PERCENT",
                defaults.price_drop_alert_percent,
            )?,
            trend_window: parse_or(&lookup, "PRICE_TREND_WINDOW", defaults.trend_window)?,
            price_epsilon: parse_or(&lookup, "PRICE_EPSILON", defaults.price_epsilon)?,
            original_price_policy: parse_or(
                &lookup,
                "ORIGINAL_PRICE_POLICY",
                defaults.original_price_policy,
            )?,
            max_timestamp_retries: parse_or(
                &lookup,
                "PRICE_HISTORY_MAX_RETRIES",
                defaults.max_timestamp_retries,
            )?,
            operation_timeout: Duration::from_millis(parse_or(
                &lookup,
                "OPERATION_TIMEOUT_MS",
                defaults.operation_timeout.as_millis() as u64,
            )?),
            balance_cache_ttl: Duration::from_secs(parse_or(
                &lookup,
                "BALANCE_CACHE_TTL_SECS",
                defaults.balance_cache_ttl.as_secs(),
            )?),
            balance_cache_capacity: parse_or(
                &lookup,
                "BALANCE_CACHE_CAPACITY",
                defaults.balance_cache_capacity,
            )?,
        };

        if settings.price_drop_alert_percent <= Decimal::ZERO {
            return Err(invalid("PRICE_DROP_ALERT_PERCENT", settings.price_drop_alert_percent));
        }
        if settings.price_epsilon <= Decimal::ZERO {
            return Err(invalid("PRICE_EPSILON", settings.price_epsilon));
        }
        if settings.trend_window < 2 {
            return Err(invalid("PRICE_TREND_WINDOW", settings.trend_window));
        }
        if settings.max_timestamp_retries == 0 {
            return Err(invalid("PRICE_HISTORY_MAX_RETRIES", 0));
        }
        if settings.operation_timeout.is_zero() {
            return Err(invalid("OPERATION_TIMEOUT_MS", 0));
        }

        Ok(Self {
            database_url,
            bind_addr,
            settings,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
            key,
            value: raw,
        }),
    }
}

fn invalid(key: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
    }
}
