//! Market data error types

use exchange::ExchangeError;
use thiserror::Error;

/// Errors that can occur during market data operations
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The bulk ticker request failed; the cycle was aborted
    #[error("Ticker fetch failed: {0}")]
    TickerFetch(#[source] ExchangeError),

    /// The refresh task panicked or was aborted
    #[error("Refresh task failed: {0}")]
    Task(String),
}
