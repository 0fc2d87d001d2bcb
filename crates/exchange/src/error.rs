//! Exchange client error types

use thiserror::Error;

/// Errors returned by exchange requests
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    /// Connection, TLS or timeout failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status
    #[error("Unexpected status {status} from {endpoint}")]
    Status { endpoint: String, status: u16 },

    /// Body did not have the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Well-formed but empty answer (e.g. no candles for a symbol)
    #[error("No data: {0}")]
    NoData(String),
}

/// Result type for exchange operations
pub type ExchangeResult<T> = std::result::Result<T, ExchangeError>;

#[cfg(feature = "client")]
impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ExchangeError::Decode(err.to_string())
        } else {
            ExchangeError::Transport(err.to_string())
        }
    }
}
