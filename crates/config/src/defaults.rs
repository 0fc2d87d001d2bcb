use std::path::PathBuf;

pub fn default_min_listing_days() -> i64 {
    90
}

pub fn default_min_quote_volume() -> f64 {
    50_000_000.0
}

pub fn default_min_open_interest() -> f64 {
    10_000_000.0
}

pub fn default_quote_asset() -> String {
    "USDT".to_string()
}

pub fn default_refresh_interval() -> u64 {
    30 * 60
}

pub fn default_run_on_startup() -> bool {
    true
}

pub fn default_open_interest_delay_ms() -> u64 {
    50
}

pub fn default_listing_delay_ms() -> u64 {
    100
}

pub fn default_exchange_base_url() -> String {
    "https://fapi.binance.com".to_string()
}

pub fn default_request_timeout() -> u64 {
    30
}

pub fn default_listing_cache_path() -> PathBuf {
    PathBuf::from("data").join("listing_cache.json")
}

pub fn default_log_format() -> String {
    "pretty".to_string()
}
