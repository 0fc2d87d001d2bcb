//! Exchange market-data client for the coin filter
//!
//! The refresh daemon only ever talks to an exchange through the
//! [`ExchangeClient`] trait. Four calls are needed: the bulk 24h ticker
//! list, per-symbol open interest, the earliest daily candle (listing date)
//! and the current price.
//!
//! # Feature Flags
//!
//! - `client` - Enable the Binance USDⓈ-M futures HTTP client

pub mod client;
pub mod error;
pub mod mock;
pub mod types;

#[cfg(feature = "client")]
pub mod binance;

pub use client::ExchangeClient;
pub use error::{ExchangeError, ExchangeResult};
pub use mock::{MockCall, MockExchangeClient};
pub use types::Ticker24h;

#[cfg(feature = "client")]
pub use binance::BinanceClient;
