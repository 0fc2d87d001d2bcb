//! Market data cache and coin qualification filter
//!
//! A background refresh daemon keeps an in-memory view of per-symbol 24h
//! tickers, open-interest notionals and listing dates. Upstream symbol
//! selection asks two read-only questions of that view:
//!
//! - [`CoinFilter::get_clean_coins`] - which candidates pass the liquidity,
//!   maturity and open-interest thresholds
//! - [`CoinFilter::get_top_volume_coins`] - which quote-asset symbols trade
//!   the most
//!
//! # Core Components
//!
//! - [`cache`] - generation-consistent store behind a reader/writer lock
//! - [`listing_store`] - JSON persistence of listing dates
//! - [`refresh`] - one refresh cycle against an [`exchange::ExchangeClient`]
//! - [`scheduler`] - the cancellable periodic task driving the cycles
//! - [`filter`] - admission predicates
//! - [`ranking`] - top-volume projection
//! - [`service`] - the [`CoinFilter`] facade wiring it all together
//!
//! # Key Invariants
//!
//! - Listing dates, once recorded, are never revised
//! - Readers see one whole refresh generation, never a mix of two
//! - Missing data excludes a symbol; it is never read as zero-and-safe

pub mod cache;
pub mod error;
pub mod filter;
pub mod listing_store;
pub mod ranking;
pub mod refresh;
pub mod scheduler;
pub mod service;

pub use cache::{CacheStats, ListingMap, MarketCache, MarketSnapshot, PublishSummary};
pub use error::MarketDataError;
pub use filter::Admission;
pub use listing_store::{ListingStore, LoadOutcome, PersistError, SaveOutcome};
pub use refresh::{CycleReport, Refresher};
pub use scheduler::RefreshHandle;
pub use service::CoinFilter;

pub type Result<T> = std::result::Result<T, MarketDataError>;
