//! Binance USDⓈ-M futures REST client

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::client::ExchangeClient;
use crate::error::{ExchangeError, ExchangeResult};
use crate::types::{parse_decimal, Ticker24h};

const TICKER_24H_PATH: &str = "/fapi/v1/ticker/24hr";
const OPEN_INTEREST_PATH: &str = "/fapi/v1/openInterest";
const KLINES_PATH: &str = "/fapi/v1/klines";
const TICKER_PRICE_PATH: &str = "/fapi/v1/ticker/price";

// Decimal fields arrive as strings: {"symbol":"BTCUSDT","lastPrice":"64000.10",...}
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TickerRow {
    symbol: String,
    quote_volume: String,
    last_price: String,
    price_change: String,
}

impl TryFrom<TickerRow> for Ticker24h {
    type Error = String;

    fn try_from(row: TickerRow) -> Result<Self, Self::Error> {
        Ok(Ticker24h {
            quote_volume: parse_decimal("quoteVolume", &row.quote_volume)?,
            last_price: parse_decimal("lastPrice", &row.last_price)?,
            price_change: parse_decimal("priceChange", &row.price_change)?,
            symbol: row.symbol.to_ascii_uppercase(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenInterestRow {
    open_interest: String,
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    price: String,
}

/// HTTP client for the Binance futures market-data endpoints
pub struct BinanceClient {
    client: Client,
    base_url: String,
}

impl BinanceClient {
    /// Create a client whose every request times out after `timeout`
    pub fn new(base_url: &str, timeout: Duration) -> ExchangeResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &config::ExchangeConfig) -> ExchangeResult<Self> {
        Self::new(&config.base_url, config.request_timeout())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ExchangeResult<T> {
        let url = format!("{}{}", self.base_url, path);

        let response = self.client.get(&url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExchangeError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    async fn fetch_all_tickers(&self) -> ExchangeResult<Vec<Ticker24h>> {
        let rows: Vec<serde_json::Value> = self.get_json(TICKER_24H_PATH, &[]).await?;
        Ok(parse_ticker_rows(rows))
    }

    async fn fetch_open_interest(&self, symbol: &str) -> ExchangeResult<f64> {
        let row: OpenInterestRow = self
            .get_json(OPEN_INTEREST_PATH, &[("symbol", symbol)])
            .await?;
        parse_decimal("openInterest", &row.open_interest).map_err(ExchangeError::Decode)
    }

    async fn fetch_earliest_candle(&self, symbol: &str) -> ExchangeResult<i64> {
        // startTime=0 with limit=1 returns the very first daily candle
        let klines: Vec<Vec<serde_json::Value>> = self
            .get_json(
                KLINES_PATH,
                &[
                    ("symbol", symbol),
                    ("interval", "1d"),
                    ("limit", "1"),
                    ("startTime", "0"),
                ],
            )
            .await?;

        earliest_open_time(symbol, &klines)
    }

    async fn fetch_current_price(&self, symbol: &str) -> ExchangeResult<f64> {
        let row: PriceRow = self
            .get_json(TICKER_PRICE_PATH, &[("symbol", symbol)])
            .await?;
        parse_decimal("price", &row.price).map_err(ExchangeError::Decode)
    }
}

/// Convert each row on its own; a row missing a field or carrying a
/// non-numeric decimal is dropped without affecting the rest.
fn parse_ticker_rows(rows: Vec<serde_json::Value>) -> Vec<Ticker24h> {
    let total = rows.len();

    let tickers: Vec<Ticker24h> = rows
        .into_iter()
        .filter_map(|value| {
            let row: TickerRow = serde_json::from_value(value)
                .map_err(|e| debug!(error = %e, "Dropping undecodable ticker row"))
                .ok()?;
            let symbol = row.symbol.clone();
            Ticker24h::try_from(row)
                .map_err(|e| debug!(%symbol, error = %e, "Dropping malformed ticker row"))
                .ok()
        })
        .collect();

    if tickers.len() < total {
        warn!(
            dropped = total - tickers.len(),
            total, "Ticker response contained malformed rows"
        );
    }

    tickers
}

/// Open time of the first kline: `[[openTime, "open", "high", ...], ...]`
fn earliest_open_time(symbol: &str, klines: &[Vec<serde_json::Value>]) -> ExchangeResult<i64> {
    let first = klines
        .first()
        .ok_or_else(|| ExchangeError::NoData(format!("no klines for {symbol}")))?;

    let open_time = first
        .first()
        .ok_or_else(|| ExchangeError::Decode(format!("empty kline row for {symbol}")))?;

    open_time
        .as_i64()
        .or_else(|| open_time.as_f64().map(|v| v as i64))
        .ok_or_else(|| ExchangeError::Decode(format!("kline open time for {symbol}: {open_time}")))
}
