//! Prometheus metrics infrastructure
//!
//! Recording through [`RefreshMetrics`] is always safe: without an installed
//! exporter the `metrics` facade drops every sample.

use metrics::{counter, gauge, histogram, Counter, Gauge, Histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Start a Prometheus exporter serving `/metrics` on `port`.
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new().with_http_listener(addr).install()?;

    tracing::info!(%addr, "Metrics server listening");
    Ok(())
}

/// How a refresh cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed,
    /// The bulk ticker fetch failed and the previous generation was kept
    Aborted,
}

impl CycleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleOutcome::Completed => "completed",
            CycleOutcome::Aborted => "aborted",
        }
    }
}

/// Which per-symbol fetch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    Tickers,
    OpenInterest,
    CurrentPrice,
    Listing,
}

impl FetchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchStage::Tickers => "tickers",
            FetchStage::OpenInterest => "open_interest",
            FetchStage::CurrentPrice => "current_price",
            FetchStage::Listing => "listing",
        }
    }
}

/// Metrics for the market data refresh daemon
///
/// # Metrics
///
/// * `coinfilter_refresh_cycles_total{outcome}` - finished cycles
/// * `coinfilter_fetch_failures_total{stage}` - failed exchange requests
/// * `coinfilter_refresh_duration_seconds` - wall time of completed cycles
/// * `coinfilter_cache_entries{map}` - entries per cache map after a publish
/// * `coinfilter_listing_saves_total{result}` - listing file writes
#[derive(Clone)]
pub struct RefreshMetrics {
    cycle_duration: Histogram,
    tickers: Gauge,
    open_interest: Gauge,
    listings: Gauge,
}

impl RefreshMetrics {
    pub fn new() -> Self {
        Self {
            cycle_duration: histogram!("coinfilter_refresh_duration_seconds"),
            tickers: gauge!("coinfilter_cache_entries", "map" => "tickers"),
            open_interest: gauge!("coinfilter_cache_entries", "map" => "open_interest"),
            listings: gauge!("coinfilter_cache_entries", "map" => "listings"),
        }
    }

    pub fn record_cycle(&self, outcome: CycleOutcome, duration: Duration) {
        cycle_counter(outcome).increment(1);
        if outcome == CycleOutcome::Completed {
            self.cycle_duration.record(duration.as_secs_f64());
        }
    }

    pub fn record_fetch_failure(&self, stage: FetchStage) {
        counter!("coinfilter_fetch_failures_total", "stage" => stage.as_str()).increment(1);
    }

    pub fn record_listing_save(&self, ok: bool) {
        let result = if ok { "ok" } else { "error" };
        counter!("coinfilter_listing_saves_total", "result" => result).increment(1);
    }

    pub fn set_cache_sizes(&self, tickers: usize, open_interest: usize, listings: usize) {
        self.tickers.set(tickers as f64);
        self.open_interest.set(open_interest as f64);
        self.listings.set(listings as f64);
    }
}

impl Default for RefreshMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn cycle_counter(outcome: CycleOutcome) -> Counter {
    counter!("coinfilter_refresh_cycles_total", "outcome" => outcome.as_str())
}
