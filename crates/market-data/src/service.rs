//! Coin filter service
//!
//! [`CoinFilter`] owns the cache and the refresher. It is built once in
//! `main` and shared by reference; queries are synchronous and never touch
//! the network.

use chrono::Utc;
use config::{CoinFilterConfig, FilterConfig, RefreshConfig};
use exchange::ExchangeClient;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, MarketCache};
use crate::filter::{self, Admission};
use crate::listing_store::{ListingStore, LoadOutcome};
use crate::ranking;
use crate::refresh::{CycleReport, Refresher};
use crate::scheduler::RefreshHandle;
use crate::Result;

pub struct CoinFilter {
    cache: Arc<MarketCache>,
    refresher: Arc<Refresher>,
    filter: FilterConfig,
    refresh: RefreshConfig,
}

impl CoinFilter {
    /// Build the service, seeding the cache from the listing file.
    ///
    /// A missing or unreadable listing file is not an error; the cache starts
    /// empty and the dates are fetched again.
    pub fn new(config: &CoinFilterConfig, client: Arc<dyn ExchangeClient>) -> Self {
        let store = ListingStore::new(&config.persistence.listing_cache_path);

        let listings = match store.load() {
            LoadOutcome::Loaded(map) => map,
            LoadOutcome::Missing => {
                info!(path = ?store.path(), "No listing cache yet, starting empty");
                Default::default()
            }
            LoadOutcome::Unreadable(e) => {
                warn!(error = %e, "Ignoring unreadable listing cache");
                Default::default()
            }
        };

        let cache = Arc::new(MarketCache::with_listings(listings));
        let refresher = Arc::new(Refresher::new(
            client,
            cache.clone(),
            store,
            config.filter.clone(),
            &config.refresh,
        ));

        Self {
            cache,
            refresher,
            filter: config.filter.clone(),
            refresh: config.refresh.clone(),
        }
    }

    /// Candidates passing every threshold, in input order, at most `limit`
    /// (`0` = no limit).
    pub fn get_clean_coins<S: AsRef<str>>(&self, candidates: &[S], limit: usize) -> Vec<String> {
        let now_ms = Utc::now().timestamp_millis();
        let clean = self
            .cache
            .read(|s| filter::clean_coins(s, &self.filter, candidates, limit, now_ms));

        debug!(
            candidates = candidates.len(),
            admitted = clean.len(),
            limit,
            "Filtered candidates"
        );
        clean
    }

    /// Per-candidate verdicts against the current generation
    pub fn explain<S: AsRef<str>>(&self, candidates: &[S]) -> Vec<(String, Admission)> {
        let now_ms = Utc::now().timestamp_millis();
        self.cache
            .read(|s| filter::explain(s, &self.filter, candidates, now_ms))
    }

    /// Quote-asset symbols by descending 24h quote volume
    pub fn get_top_volume_coins(&self, limit: usize) -> Vec<String> {
        self.cache
            .read(|s| ranking::top_volume(s, &self.filter.quote_asset, limit))
    }

    /// Run one refresh cycle now, outside the periodic task
    pub async fn refresh_now(&self) -> Result<CycleReport> {
        self.refresher.run_cycle().await
    }

    /// Spawn the periodic refresh task
    pub fn start(&self, token: CancellationToken) -> RefreshHandle {
        RefreshHandle::spawn(
            self.refresher.clone(),
            self.refresh.interval(),
            self.refresh.run_on_startup,
            token,
        )
    }

    pub fn cache(&self) -> &Arc<MarketCache> {
        &self.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ListingMap;
    use config::PersistenceConfig;
    use exchange::{MockCall, MockExchangeClient, Ticker24h};
    use std::time::Duration;
    use tokio::sync::Semaphore;

    const DAY_MS: i64 = 86_400_000;

    fn config(dir: &tempfile::TempDir) -> CoinFilterConfig {
        CoinFilterConfig {
            refresh: RefreshConfig {
                open_interest_delay_ms: 0,
                listing_delay_ms: 0,
                ..RefreshConfig::default()
            },
            persistence: PersistenceConfig {
                listing_cache_path: dir.path().join("listing_cache.json"),
            },
            ..CoinFilterConfig::default()
        }
    }

    fn old() -> i64 {
        Utc::now().timestamp_millis() - 400 * DAY_MS
    }

    fn market() -> MockExchangeClient {
        MockExchangeClient::new()
            .with_ticker("BTCUSDT", 15_000_000_000.0, 64_000.0)
            .with_ticker("ETHUSDT", 8_000_000_000.0, 3_000.0)
            .with_ticker("SOLUSDT", 900_000_000.0, 150.0)
            .with_ticker("NEWUSDT", 200_000_000.0, 1.0)
            .with_ticker("DUSTUSDT", 1_000.0, 0.01)
            .with_ticker("ETHBTC", 60_000_000_000.0, 0.05)
            .with_open_interest("BTCUSDT", 80_000.0)
            .with_open_interest("ETHUSDT", 1_000_000.0)
            .with_open_interest("SOLUSDT", 5.0)
            .with_open_interest("NEWUSDT", 50_000_000.0)
            .with_listing("BTCUSDT", old())
            .with_listing("ETHUSDT", old())
            .with_listing("SOLUSDT", old())
            .with_listing("NEWUSDT", Utc::now().timestamp_millis() - 10 * DAY_MS)
    }

    #[tokio::test]
    async fn test_queries_before_first_refresh_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let service = CoinFilter::new(&config(&dir), Arc::new(market()));

        assert!(service.get_clean_coins(&["BTCUSDT"], 0).is_empty());
        assert!(service.get_top_volume_coins(10).is_empty());
        assert_eq!(service.stats().generation, 0);
    }

    #[tokio::test]
    async fn test_clean_coins_after_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let service = CoinFilter::new(&config(&dir), Arc::new(market()));
        service.refresh_now().await.unwrap();

        let candidates = ["solusdt", "ETHUSDT", "NEWUSDT", "DUSTUSDT", "BTCUSDT", "XYZUSDT"];
        assert_eq!(service.get_clean_coins(&candidates, 0), vec!["ETHUSDT", "BTCUSDT"]);
        assert_eq!(service.get_clean_coins(&candidates, 1), vec!["ETHUSDT"]);

        let verdicts = service.explain(&candidates);
        assert_eq!(verdicts[0], ("SOLUSDT".to_string(), Admission::LowOpenInterest));
        assert_eq!(verdicts[2].1, Admission::TooYoung);
        assert_eq!(verdicts[3].1, Admission::LowVolume);
        assert_eq!(verdicts[5].1, Admission::NoTicker);
    }

    #[tokio::test]
    async fn test_top_volume_coins() {
        let dir = tempfile::tempdir().unwrap();
        let service = CoinFilter::new(&config(&dir), Arc::new(market()));
        service.refresh_now().await.unwrap();

        assert_eq!(
            service.get_top_volume_coins(3),
            vec!["BTCUSDT", "ETHUSDT", "SOLUSDT"]
        );
        assert_eq!(service.get_top_volume_coins(0).len(), 5);
    }

    #[tokio::test]
    async fn test_listings_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);

        let first = CoinFilter::new(&config, Arc::new(market()));
        first.refresh_now().await.unwrap();
        let persisted = first.cache().listing_snapshot();
        assert_eq!(persisted.len(), 4);

        let client = Arc::new(market());
        let second = CoinFilter::new(&config, client.clone());
        assert_eq!(second.stats().listings, 4);

        second.refresh_now().await.unwrap();
        assert_eq!(
            client.count_calls(|c| matches!(c, MockCall::EarliestCandle(_))),
            0
        );
        assert_eq!(second.cache().listing_snapshot(), persisted);
    }

    #[tokio::test]
    async fn test_unreadable_listing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        std::fs::write(&config.persistence.listing_cache_path, "[1, 2").unwrap();

        let service = CoinFilter::new(&config, Arc::new(market()));
        assert_eq!(service.stats().listings, 0);

        let report = service.refresh_now().await.unwrap();
        assert!(report.save.map(|s| s.is_saved()).unwrap_or(false));
        assert_eq!(
            ListingStore::new(&config.persistence.listing_cache_path)
                .load()
                .into_map()
                .len(),
            4
        );
    }

    #[tokio::test]
    async fn test_concurrent_queries_during_refresh_see_whole_generations() {
        let dir = tempfile::tempdir().unwrap();
        let gate = Arc::new(Semaphore::new(0));
        let client = Arc::new(market().with_open_interest_gate(gate.clone()));
        let service = Arc::new(CoinFilter::new(&config(&dir), client.clone()));

        // BTCUSDT, ETHBTC, ETHUSDT, NEWUSDT and SOLUSDT clear the volume bar
        gate.add_permits(5);
        tokio::time::timeout(Duration::from_secs(5), service.refresh_now())
            .await
            .expect("first refresh stalled on the gate")
            .unwrap();
        let first = service.get_clean_coins(&["BTCUSDT", "ETHUSDT", "SOLUSDT"], 0);
        assert_eq!(first, vec!["BTCUSDT", "ETHUSDT"]);

        // Next generation: BTC drops below the volume threshold, SOL gains OI
        client.set_tickers(vec![
            Ticker24h::new("BTCUSDT", 1.0, 64_000.0),
            Ticker24h::new("ETHUSDT", 8_000_000_000.0, 3_000.0),
            Ticker24h::new("SOLUSDT", 900_000_000.0, 150.0),
        ]);
        client.set_open_interest("SOLUSDT", 1_000_000.0);

        let refreshing = {
            let service = service.clone();
            tokio::spawn(async move { service.refresh_now().await.map(|r| r.generation) })
        };

        // Cycle is staged but parked; readers still get generation 1 in full
        tokio::time::sleep(Duration::from_millis(20)).await;
        for _ in 0..10 {
            let stats = service.stats();
            assert_eq!(stats.generation, 1);
            assert_eq!(stats.tickers, 6);
            assert_eq!(
                service.get_clean_coins(&["BTCUSDT", "ETHUSDT", "SOLUSDT"], 0),
                first
            );
        }

        gate.add_permits(2);
        let generation = tokio::time::timeout(Duration::from_secs(5), refreshing)
            .await
            .expect("second refresh stalled on the gate")
            .unwrap()
            .unwrap();
        assert_eq!(generation, 2);

        assert_eq!(service.stats().tickers, 3);
        assert_eq!(
            service.get_clean_coins(&["BTCUSDT", "ETHUSDT", "SOLUSDT"], 0),
            vec!["ETHUSDT", "SOLUSDT"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_and_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let service = CoinFilter::new(&config(&dir), Arc::new(market()));

        let handle = service.start(CancellationToken::new());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(service.stats().generation, 1);

        handle.shutdown().await.unwrap();
        assert!(!service.get_top_volume_coins(1).is_empty());
    }

    #[test]
    fn test_seeded_listings_are_queryable() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let listings = ListingMap::from([("BTCUSDT".to_string(), old())]);
        ListingStore::new(&config.persistence.listing_cache_path).save(&listings);

        let service = CoinFilter::new(&config, Arc::new(MockExchangeClient::new()));
        assert!(service.cache().has_listing("BTCUSDT"));
    }
}
