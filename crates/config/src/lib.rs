//! Configuration for the coin filter.
//!
//! Every section and field is defaulted, so an empty YAML document (or no
//! file at all) yields the stock thresholds: 90 listing days, 50M quote
//! volume and 10M open interest.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CoinFilterConfig {
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

/// Hard admission thresholds for candidate coins
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Minimum age of the first traded day, in days
    #[serde(default = "default_min_listing_days")]
    pub min_listing_days: i64,
    /// Minimum 24h quote volume (quote currency)
    #[serde(rename = "min_quote_volume_24h")]
    #[serde(default = "default_min_quote_volume")]
    pub min_quote_volume: f64,
    /// Minimum open-interest notional (quote currency)
    #[serde(default = "default_min_open_interest")]
    pub min_open_interest: f64,
    /// Quote-currency suffix of the tracked symbols, e.g. `USDT`
    #[serde(default = "default_quote_asset")]
    pub quote_asset: String,
}

impl FilterConfig {
    /// Minimum listing age expressed in epoch milliseconds.
    pub fn min_listing_age_ms(&self) -> i64 {
        self.min_listing_days.saturating_mul(MS_PER_DAY)
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_listing_days: default_min_listing_days(),
            min_quote_volume: default_min_quote_volume(),
            min_open_interest: default_min_open_interest(),
            quote_asset: default_quote_asset(),
        }
    }
}

/// Background refresh cycle configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RefreshConfig {
    /// Interval between cycles in seconds
    #[serde(default = "default_refresh_interval")]
    pub interval_seconds: u64,
    /// Whether to run a cycle immediately on startup
    #[serde(default = "default_run_on_startup")]
    pub run_on_startup: bool,
    /// Delay before each open-interest request
    #[serde(default = "default_open_interest_delay_ms")]
    pub open_interest_delay_ms: u64,
    /// Delay before each listing-date request
    #[serde(default = "default_listing_delay_ms")]
    pub listing_delay_ms: u64,
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn open_interest_delay(&self) -> Duration {
        Duration::from_millis(self.open_interest_delay_ms)
    }

    pub fn listing_delay(&self) -> Duration {
        Duration::from_millis(self.listing_delay_ms)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_refresh_interval(),
            run_on_startup: default_run_on_startup(),
            open_interest_delay_ms: default_open_interest_delay_ms(),
            listing_delay_ms: default_listing_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExchangeConfig {
    /// REST base URL of the futures API
    #[serde(default = "default_exchange_base_url")]
    pub base_url: String,
    /// Timeout applied to every individual request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl ExchangeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_exchange_base_url(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PersistenceConfig {
    /// File holding the symbol -> listing time map
    #[serde(default = "default_listing_cache_path")]
    pub listing_cache_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            listing_cache_path: default_listing_cache_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// One of `pretty`, `json`, `compact`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MonitoringConfig {
    /// Prometheus listener port; metrics are not exported when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: CoinFilterConfig = serde_yaml::from_str("{}").unwrap();

        assert_eq!(config, CoinFilterConfig::default());
        assert_eq!(config.filter.min_listing_days, 90);
        assert_eq!(config.filter.min_quote_volume, 50_000_000.0);
        assert_eq!(config.filter.min_open_interest, 10_000_000.0);
        assert_eq!(config.filter.quote_asset, "USDT");
        assert_eq!(config.refresh.interval_seconds, 30 * 60);
        assert!(config.refresh.run_on_startup);
        assert_eq!(config.refresh.open_interest_delay(), Duration::from_millis(50));
        assert_eq!(config.refresh.listing_delay(), Duration::from_millis(100));
        assert_eq!(config.exchange.request_timeout(), Duration::from_secs(30));
        assert_eq!(
            config.persistence.listing_cache_path,
            PathBuf::from("data/listing_cache.json")
        );
        assert_eq!(config.monitoring.metrics_port, None);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let yaml = r#"
filter:
  min_listing_days: 30
  min_quote_volume_24h: 1000
refresh:
  interval_seconds: 600
"#;
        let config: CoinFilterConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.filter.min_listing_days, 30);
        assert_eq!(config.filter.min_quote_volume, 1000.0);
        assert_eq!(config.filter.min_open_interest, 10_000_000.0);
        assert_eq!(config.refresh.interval(), Duration::from_secs(600));
        assert_eq!(config.refresh.listing_delay_ms, 100);
        assert_eq!(config.exchange, ExchangeConfig::default());
    }

    #[test]
    fn test_min_listing_age_ms() {
        let filter = FilterConfig::default();
        assert_eq!(filter.min_listing_age_ms(), 90 * 86_400_000);

        let huge = FilterConfig {
            min_listing_days: i64::MAX,
            ..FilterConfig::default()
        };
        assert_eq!(huge.min_listing_age_ms(), i64::MAX);
    }
}
