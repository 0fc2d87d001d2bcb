//! Scriptable in-memory exchange for tests and dry runs

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::client::ExchangeClient;
use crate::error::{ExchangeError, ExchangeResult};
use crate::types::Ticker24h;

/// A request received by [`MockExchangeClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Tickers,
    OpenInterest(String),
    EarliestCandle(String),
    CurrentPrice(String),
}

#[derive(Debug, Default)]
struct MockMarket {
    tickers: Vec<Ticker24h>,
    tickers_fail: bool,
    open_interest: HashMap<String, f64>,
    open_interest_fail: HashSet<String>,
    listings: HashMap<String, i64>,
    prices: HashMap<String, f64>,
}

/// Mock exchange client
///
/// Answers from an in-memory market that tests can change between cycles.
/// Symbols without a scripted value answer with [`ExchangeError::NoData`].
#[derive(Default)]
pub struct MockExchangeClient {
    market: Mutex<MockMarket>,
    calls: Mutex<Vec<MockCall>>,
    open_interest_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MockExchangeClient {
    /// Create an empty mock exchange
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a ticker to the bulk response
    pub fn with_ticker(self, symbol: &str, quote_volume: f64, last_price: f64) -> Self {
        self.market
            .lock()
            .tickers
            .push(Ticker24h::new(symbol, quote_volume, last_price));
        self
    }

    /// Script the raw open interest returned for `symbol`
    pub fn with_open_interest(self, symbol: &str, contracts: f64) -> Self {
        self.set_open_interest(symbol, contracts);
        self
    }

    /// Script the earliest candle open time returned for `symbol`
    pub fn with_listing(self, symbol: &str, open_time_ms: i64) -> Self {
        self.set_listing(symbol, open_time_ms);
        self
    }

    /// Script the current price returned for `symbol`
    pub fn with_price(self, symbol: &str, price: f64) -> Self {
        self.market.lock().prices.insert(symbol.to_string(), price);
        self
    }

    /// Make open-interest requests wait for a permit on `gate`
    pub fn with_open_interest_gate(self, gate: Arc<Semaphore>) -> Self {
        *self.open_interest_gate.lock() = Some(gate);
        self
    }

    /// Replace the whole bulk ticker response
    pub fn set_tickers(&self, tickers: Vec<Ticker24h>) {
        self.market.lock().tickers = tickers;
    }

    /// Make the bulk ticker request fail (or succeed again)
    pub fn set_tickers_failing(&self, failing: bool) {
        self.market.lock().tickers_fail = failing;
    }

    pub fn set_open_interest(&self, symbol: &str, contracts: f64) {
        self.market
            .lock()
            .open_interest
            .insert(symbol.to_string(), contracts);
    }

    /// Make open-interest requests for `symbol` fail with a transport error
    pub fn set_open_interest_failing(&self, symbol: &str) {
        self.market
            .lock()
            .open_interest_fail
            .insert(symbol.to_string());
    }

    pub fn set_listing(&self, symbol: &str, open_time_ms: i64) {
        self.market
            .lock()
            .listings
            .insert(symbol.to_string(), open_time_ms);
    }

    /// All requests received so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Number of received requests matching `pred`
    pub fn count_calls(&self, pred: impl Fn(&MockCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl ExchangeClient for MockExchangeClient {
    async fn fetch_all_tickers(&self) -> ExchangeResult<Vec<Ticker24h>> {
        self.record(MockCall::Tickers);

        let market = self.market.lock();
        if market.tickers_fail {
            return Err(ExchangeError::Transport("mock: tickers unavailable".to_string()));
        }
        Ok(market.tickers.clone())
    }

    async fn fetch_open_interest(&self, symbol: &str) -> ExchangeResult<f64> {
        self.record(MockCall::OpenInterest(symbol.to_string()));

        let gate = self.open_interest_gate.lock().clone();
        if let Some(gate) = gate {
            gate.acquire()
                .await
                .map_err(|e| ExchangeError::Transport(e.to_string()))?
                .forget();
        }

        let market = self.market.lock();
        if market.open_interest_fail.contains(symbol) {
            return Err(ExchangeError::Transport(format!("mock: open interest for {symbol}")));
        }
        market
            .open_interest
            .get(symbol)
            .copied()
            .ok_or_else(|| ExchangeError::NoData(symbol.to_string()))
    }

    async fn fetch_earliest_candle(&self, symbol: &str) -> ExchangeResult<i64> {
        self.record(MockCall::EarliestCandle(symbol.to_string()));

        self.market
            .lock()
            .listings
            .get(symbol)
            .copied()
            .ok_or_else(|| ExchangeError::NoData(symbol.to_string()))
    }

    async fn fetch_current_price(&self, symbol: &str) -> ExchangeResult<f64> {
        self.record(MockCall::CurrentPrice(symbol.to_string()));

        self.market
            .lock()
            .prices
            .get(symbol)
            .copied()
            .ok_or_else(|| ExchangeError::NoData(symbol.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_answers() {
        let client = MockExchangeClient::new()
            .with_ticker("BTCUSDT", 1_000.0, 50_000.0)
            .with_open_interest("BTCUSDT", 12.5)
            .with_listing("BTCUSDT", 1_567_900_800_000)
            .with_price("BTCUSDT", 50_100.0);

        let tickers = client.fetch_all_tickers().await.unwrap();
        assert_eq!(tickers.len(), 1);
        assert_eq!(client.fetch_open_interest("BTCUSDT").await.unwrap(), 12.5);
        assert_eq!(
            client.fetch_earliest_candle("BTCUSDT").await.unwrap(),
            1_567_900_800_000
        );
        assert_eq!(client.fetch_current_price("BTCUSDT").await.unwrap(), 50_100.0);

        assert_eq!(
            client.calls(),
            vec![
                MockCall::Tickers,
                MockCall::OpenInterest("BTCUSDT".to_string()),
                MockCall::EarliestCandle("BTCUSDT".to_string()),
                MockCall::CurrentPrice("BTCUSDT".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_unscripted_and_failing() {
        let client = MockExchangeClient::new();
        client.set_tickers_failing(true);
        client.set_open_interest_failing("ETHUSDT");

        assert!(matches!(
            client.fetch_all_tickers().await,
            Err(ExchangeError::Transport(_))
        ));
        assert!(matches!(
            client.fetch_open_interest("ETHUSDT").await,
            Err(ExchangeError::Transport(_))
        ));
        assert_eq!(
            client.fetch_earliest_candle("ETHUSDT").await,
            Err(ExchangeError::NoData("ETHUSDT".to_string()))
        );

        client.set_tickers_failing(false);
        assert!(client.fetch_all_tickers().await.unwrap().is_empty());
        assert_eq!(client.count_calls(|c| *c == MockCall::Tickers), 2);
    }
}
