//! Exchange domain types

use serde::{Deserialize, Serialize};

/// 24h rolling statistics for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker24h {
    /// Uppercase symbol, e.g. `BTCUSDT`
    pub symbol: String,
    /// Traded notional over the last 24h, in the quote currency
    pub quote_volume: f64,
    pub last_price: f64,
    pub price_change: f64,
}

impl Ticker24h {
    pub fn new(symbol: impl Into<String>, quote_volume: f64, last_price: f64) -> Self {
        Self {
            symbol: symbol.into().to_ascii_uppercase(),
            quote_volume,
            last_price,
            price_change: 0.0,
        }
    }

    pub fn with_price_change(mut self, price_change: f64) -> Self {
        self.price_change = price_change;
        self
    }
}

/// Parse a decimal string as sent by the exchange ("123.45").
///
/// Non-finite values are rejected along with garbage.
pub fn parse_decimal(field: &str, raw: &str) -> Result<f64, String> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("{field}: '{raw}' is not a decimal")),
    }
}
