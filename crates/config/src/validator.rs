use crate::*;
use regex::Regex;
use thiserror::Error;
use url::Url;

const KNOWN_LOG_FORMATS: [&str; 3] = ["pretty", "json", "compact"];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must not be negative, got: {value}")]
    NegativeThreshold { field: String, value: f64 },

    #[error("filter.quote_asset must be uppercase alphanumeric, got: '{0}'")]
    InvalidQuoteAsset(String),

    #[error("{field} must be a positive integer")]
    InvalidPositiveInteger { field: String },

    #[error("Invalid exchange base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    #[error("persistence.listing_cache_path must not be empty")]
    EmptyListingCachePath,

    #[error("Unknown log format '{0}'. Must be one of: pretty, json, compact")]
    UnknownLogFormat(String),
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.to_string(),
        });
    }
}

pub fn validate_config(config: &CoinFilterConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_filter(&config.filter, &mut report);
    validate_refresh(&config.refresh, &mut report);
    validate_exchange(&config.exchange, &mut report);
    validate_persistence(&config.persistence, &mut report);
    validate_logging(&config.logging, &mut report);
    validate_monitoring(&config.monitoring, &mut report);

    report
}

fn validate_filter(filter: &FilterConfig, report: &mut ValidationReport) {
    if filter.min_listing_days < 0 {
        report.add_error(ValidationError::NegativeThreshold {
            field: "filter.min_listing_days".to_string(),
            value: filter.min_listing_days as f64,
        });
    }

    for (field, value) in [
        ("filter.min_quote_volume_24h", filter.min_quote_volume),
        ("filter.min_open_interest", filter.min_open_interest),
    ] {
        if value.is_nan() || value < 0.0 {
            report.add_error(ValidationError::NegativeThreshold {
                field: field.to_string(),
                value,
            });
        }
    }

    let quote_ok = Regex::new(r"^[A-Z0-9]+$")
        .map(|re| re.is_match(&filter.quote_asset))
        .unwrap_or(false);
    if !quote_ok {
        report.add_error(ValidationError::InvalidQuoteAsset(filter.quote_asset.clone()));
    }
}

fn validate_refresh(refresh: &RefreshConfig, report: &mut ValidationReport) {
    if refresh.interval_seconds == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "refresh.interval_seconds".to_string(),
        });
    } else if refresh.interval_seconds < 60 {
        report.add_warning(
            "refresh.interval_seconds",
            "Intervals under a minute re-fetch open interest for every liquid symbol each time",
        );
    }

    if refresh.open_interest_delay_ms == 0 {
        report.add_warning(
            "refresh.open_interest_delay_ms",
            "No delay between open-interest requests; the exchange may rate-limit the cycle",
        );
    }

    if refresh.listing_delay_ms == 0 {
        report.add_warning(
            "refresh.listing_delay_ms",
            "No delay between listing-date requests; the exchange may rate-limit the cycle",
        );
    }
}

fn validate_exchange(exchange: &ExchangeConfig, report: &mut ValidationReport) {
    match Url::parse(&exchange.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => report.add_error(ValidationError::InvalidBaseUrl {
            url: exchange.base_url.clone(),
            message: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => report.add_error(ValidationError::InvalidBaseUrl {
            url: exchange.base_url.clone(),
            message: e.to_string(),
        }),
    }

    if exchange.request_timeout_seconds == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "exchange.request_timeout_seconds".to_string(),
        });
    }
}

fn validate_persistence(persistence: &PersistenceConfig, report: &mut ValidationReport) {
    if persistence.listing_cache_path.as_os_str().is_empty() {
        report.add_error(ValidationError::EmptyListingCachePath);
    }
}

fn validate_logging(logging: &LoggingConfig, report: &mut ValidationReport) {
    let format = logging.format.to_lowercase();
    if !KNOWN_LOG_FORMATS.contains(&format.as_str()) {
        report.add_error(ValidationError::UnknownLogFormat(logging.format.clone()));
    }
}

fn validate_monitoring(monitoring: &MonitoringConfig, report: &mut ValidationReport) {
    if let Some(port) = monitoring.metrics_port {
        if port < 1024 {
            report.add_warning(
                "monitoring.metrics_port",
                "Privileged port; the exporter may fail to bind without elevated rights",
            );
        }
    }
}
