//! Exchange client trait

use async_trait::async_trait;

use crate::error::ExchangeResult;
use crate::types::Ticker24h;

/// Client trait for the exchange market-data API - protocol agnostic
///
/// Implementations apply their own per-request timeout. None of the calls
/// retry; the refresh daemon decides what a failure means.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Fetch 24h statistics for every listed symbol in one request
    async fn fetch_all_tickers(&self) -> ExchangeResult<Vec<Ticker24h>>;

    /// Fetch the raw open interest (contract quantity) of a symbol
    async fn fetch_open_interest(&self, symbol: &str) -> ExchangeResult<f64>;

    /// Fetch the open time (epoch ms) of the first daily candle ever traded
    async fn fetch_earliest_candle(&self, symbol: &str) -> ExchangeResult<i64>;

    /// Fetch the latest traded price of a symbol
    async fn fetch_current_price(&self, symbol: &str) -> ExchangeResult<f64>;
}
