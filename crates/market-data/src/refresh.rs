//! One refresh cycle
//!
//! All network I/O lands in local maps first; the cache write lock is taken
//! once, at the end, for the swap. Only the bulk ticker request can abort a
//! cycle. Per-symbol failures degrade to zero (open interest) or to "try
//! again next cycle" (listing dates).

use config::{FilterConfig, RefreshConfig};
use exchange::{ExchangeClient, Ticker24h};
use observability::{CycleOutcome, FetchStage, RefreshMetrics};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::cache::{ListingMap, MarketCache};
use crate::error::MarketDataError;
use crate::listing_store::{ListingStore, SaveOutcome};
use crate::Result;

/// What one successful cycle did
#[derive(Debug)]
pub struct CycleReport {
    /// Cache generation published by this cycle
    pub generation: u64,
    pub tickers: usize,
    /// Symbols that passed the volume threshold
    pub open_interest_evaluated: usize,
    pub open_interest_failures: usize,
    pub listing_requested: usize,
    pub listing_added: usize,
    pub listing_failures: usize,
    /// `None` when the listing map did not change
    pub save: Option<SaveOutcome>,
    pub duration: Duration,
}

/// Runs refresh cycles against an exchange and publishes into a cache
///
/// Cycles never overlap: a second caller waits until the running cycle has
/// published, then fetches its own generation.
pub struct Refresher {
    client: Arc<dyn ExchangeClient>,
    cache: Arc<MarketCache>,
    store: ListingStore,
    filter: FilterConfig,
    open_interest_delay: Duration,
    listing_delay: Duration,
    metrics: RefreshMetrics,
    /// Held for the whole of `run_cycle`
    cycle: Mutex<()>,
}

impl Refresher {
    pub fn new(
        client: Arc<dyn ExchangeClient>,
        cache: Arc<MarketCache>,
        store: ListingStore,
        filter: FilterConfig,
        refresh: &RefreshConfig,
    ) -> Self {
        Self {
            client,
            cache,
            store,
            filter,
            open_interest_delay: refresh.open_interest_delay(),
            listing_delay: refresh.listing_delay(),
            metrics: RefreshMetrics::new(),
            cycle: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &Arc<MarketCache> {
        &self.cache
    }

    /// Fetch, stage and publish one generation.
    ///
    /// On a bulk ticker failure the cache is left exactly as it was.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let _cycle = self.cycle.lock().await;
        let started = Instant::now();
        info!("Starting market data refresh");

        let tickers = match self.client.fetch_all_tickers().await {
            Ok(tickers) => tickers,
            Err(e) => {
                error!(error = %e, "Ticker fetch failed, keeping previous market data");
                self.metrics.record_fetch_failure(FetchStage::Tickers);
                self.metrics
                    .record_cycle(CycleOutcome::Aborted, started.elapsed());
                return Err(MarketDataError::TickerFetch(e));
            }
        };

        let staged: HashMap<String, Ticker24h> = tickers
            .into_iter()
            .map(|t| (t.symbol.to_ascii_uppercase(), t))
            .collect();

        let mut qualifying: Vec<&str> = staged
            .iter()
            .filter(|(_, t)| t.quote_volume >= self.filter.min_quote_volume)
            .map(|(symbol, _)| symbol.as_str())
            .collect();
        qualifying.sort_unstable();

        let listing_targets: Vec<&str> = qualifying
            .iter()
            .copied()
            .filter(|s| s.ends_with(&self.filter.quote_asset) && !self.cache.has_listing(s))
            .collect();

        debug!(
            tickers = staged.len(),
            qualifying = qualifying.len(),
            listing_targets = listing_targets.len(),
            "Staged tickers"
        );

        let (open_interest, open_interest_failures) =
            self.fetch_open_interest(&staged, &qualifying).await;
        let (new_listings, listing_failures) = self.fetch_listings(&listing_targets).await;

        let listing_requested = listing_targets.len();
        let open_interest_evaluated = qualifying.len();
        let ticker_count = staged.len();
        let open_interest_count = open_interest.len();

        let summary = self.cache.publish(staged, open_interest, new_listings);

        let save = if summary.listings_changed() {
            let outcome = self.store.save(&self.cache.listing_snapshot());
            self.metrics.record_listing_save(outcome.is_saved());
            Some(outcome)
        } else {
            None
        };

        let duration = started.elapsed();
        self.metrics
            .set_cache_sizes(ticker_count, open_interest_count, summary.listings_after);
        self.metrics.record_cycle(CycleOutcome::Completed, duration);

        info!(
            generation = summary.generation,
            tickers = ticker_count,
            open_interest = open_interest_evaluated,
            open_interest_failures,
            listings_added = summary.listings_added,
            listing_failures,
            duration_ms = duration.as_millis() as u64,
            "Market data refresh complete"
        );

        Ok(CycleReport {
            generation: summary.generation,
            tickers: ticker_count,
            open_interest_evaluated,
            open_interest_failures,
            listing_requested,
            listing_added: summary.listings_added,
            listing_failures,
            save,
            duration,
        })
    }

    /// Sequential open-interest notionals; a failed symbol records 0.
    async fn fetch_open_interest(
        &self,
        tickers: &HashMap<String, Ticker24h>,
        symbols: &[&str],
    ) -> (HashMap<String, f64>, usize) {
        let mut notionals = HashMap::with_capacity(symbols.len());
        let mut failures = 0;

        for &symbol in symbols {
            pause(self.open_interest_delay).await;

            let contracts = match self.client.fetch_open_interest(symbol).await {
                Ok(contracts) => contracts,
                Err(e) => {
                    warn!(%symbol, error = %e, "Open interest fetch failed");
                    self.metrics.record_fetch_failure(FetchStage::OpenInterest);
                    failures += 1;
                    notionals.insert(symbol.to_string(), 0.0);
                    continue;
                }
            };

            let last_price = tickers.get(symbol).map(|t| t.last_price).unwrap_or(0.0);
            let price = if last_price == 0.0 {
                self.current_price(symbol).await
            } else {
                last_price
            };

            notionals.insert(symbol.to_string(), contracts * price);
        }

        (notionals, failures)
    }

    /// Live price for a symbol whose ticker reported 0; 0 on failure
    async fn current_price(&self, symbol: &str) -> f64 {
        match self.client.fetch_current_price(symbol).await {
            Ok(price) => price,
            Err(e) => {
                warn!(%symbol, error = %e, "Current price fallback failed");
                self.metrics.record_fetch_failure(FetchStage::CurrentPrice);
                0.0
            }
        }
    }

    /// Sequential earliest-candle lookups; failures are retried next cycle.
    async fn fetch_listings(&self, symbols: &[&str]) -> (ListingMap, usize) {
        let mut listings = ListingMap::new();
        let mut failures = 0;

        for &symbol in symbols {
            pause(self.listing_delay).await;

            match self.client.fetch_earliest_candle(symbol).await {
                Ok(open_time) => {
                    debug!(%symbol, open_time, "Discovered listing date");
                    listings.insert(symbol.to_string(), open_time);
                }
                Err(e) => {
                    warn!(%symbol, error = %e, "Listing date fetch failed");
                    self.metrics.record_fetch_failure(FetchStage::Listing);
                    failures += 1;
                }
            }
        }

        (listings, failures)
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
