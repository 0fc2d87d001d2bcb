//! Generation-consistent market data cache
//!
//! The ticker and open-interest maps are replaced together in one write
//! window, so a reader holding the read guard always sees a single refresh
//! generation. The listing map is merged into, never replaced.

use chrono::{DateTime, Utc};
use exchange::Ticker24h;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// Uppercase symbol -> open time (epoch ms) of its first traded day
pub type ListingMap = BTreeMap<String, i64>;

/// Everything the filter and ranking queries read
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    pub tickers: HashMap<String, Ticker24h>,
    /// Only symbols that passed the volume threshold in the last cycle
    pub open_interest: HashMap<String, f64>,
    pub listings: ListingMap,
    /// Completed publishes; 0 until the first successful cycle
    pub generation: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl MarketSnapshot {
    pub fn quote_volume(&self, symbol: &str) -> Option<f64> {
        self.tickers.get(symbol).map(|t| t.quote_volume)
    }

    pub fn listing_time(&self, symbol: &str) -> Option<i64> {
        self.listings.get(symbol).copied()
    }

    pub fn open_interest(&self, symbol: &str) -> Option<f64> {
        self.open_interest.get(symbol).copied()
    }
}

/// Result of one [`MarketCache::publish`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishSummary {
    pub generation: u64,
    pub listings_before: usize,
    pub listings_after: usize,
    pub listings_added: usize,
}

impl PublishSummary {
    /// Whether the listing map differs from what was on disk before
    pub fn listings_changed(&self) -> bool {
        self.listings_added > 0
    }
}

/// Sizes and freshness of the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub generation: u64,
    pub tickers: usize,
    pub open_interest: usize,
    pub listings: usize,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Shared market data cache: many readers, one writer
#[derive(Debug, Default)]
pub struct MarketCache {
    inner: RwLock<MarketSnapshot>,
}

impl MarketCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache seeded with previously persisted listing dates
    pub fn with_listings(listings: ListingMap) -> Self {
        Self {
            inner: RwLock::new(MarketSnapshot {
                listings,
                ..MarketSnapshot::default()
            }),
        }
    }

    /// Evaluate `f` against one consistent snapshot.
    ///
    /// `f` runs while the read guard is held; keep it short and never block
    /// inside it.
    pub fn read<R>(&self, f: impl FnOnce(&MarketSnapshot) -> R) -> R {
        let guard = self.inner.read();
        f(&guard)
    }

    /// Swap in a new generation and merge newly discovered listing dates.
    ///
    /// Existing listing entries are kept even when `new_listings` carries a
    /// different value for the same symbol.
    pub fn publish(
        &self,
        tickers: HashMap<String, Ticker24h>,
        open_interest: HashMap<String, f64>,
        new_listings: ListingMap,
    ) -> PublishSummary {
        let mut guard = self.inner.write();

        let listings_before = guard.listings.len();
        for (symbol, open_time) in new_listings {
            guard.listings.entry(symbol).or_insert(open_time);
        }
        let listings_after = guard.listings.len();

        guard.tickers = tickers;
        guard.open_interest = open_interest;
        guard.generation += 1;
        guard.updated_at = Some(Utc::now());

        PublishSummary {
            generation: guard.generation,
            listings_before,
            listings_after,
            listings_added: listings_after - listings_before,
        }
    }

    pub fn has_listing(&self, symbol: &str) -> bool {
        self.inner.read().listings.contains_key(symbol)
    }

    /// Copy of the listing map, e.g. for persisting outside the lock
    pub fn listing_snapshot(&self) -> ListingMap {
        self.inner.read().listings.clone()
    }

    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    pub fn stats(&self) -> CacheStats {
        self.read(|s| CacheStats {
            generation: s.generation,
            tickers: s.tickers.len(),
            open_interest: s.open_interest.len(),
            listings: s.listings.len(),
            updated_at: s.updated_at,
        })
    }
}
