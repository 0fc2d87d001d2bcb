//! Coin admission predicates
//!
//! A candidate is admitted only if every check passes, in this order:
//!
//! 1. Liquidity: 24h quote volume >= `min_quote_volume`
//! 2. Maturity: listing date known and strictly older than `min_listing_days`
//! 3. Open interest: notional >= `min_open_interest`
//!
//! Missing data at any step excludes the symbol.

use config::FilterConfig;
use tracing::trace;

use crate::cache::MarketSnapshot;

/// Verdict for one candidate; anything but `Admitted` names the first failed check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// Not in the ticker map of the current generation
    NoTicker,
    LowVolume,
    /// Listing date not fetched yet
    NoListing,
    TooYoung,
    LowOpenInterest,
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        *self == Admission::Admitted
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Admission::Admitted => "admitted",
            Admission::NoTicker => "no ticker",
            Admission::LowVolume => "low volume",
            Admission::NoListing => "no listing date",
            Admission::TooYoung => "too young",
            Admission::LowOpenInterest => "low open interest",
        }
    }
}

impl std::fmt::Display for Admission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evaluate one uppercase symbol against the snapshot at time `now_ms`.
pub fn admission(
    snapshot: &MarketSnapshot,
    thresholds: &FilterConfig,
    symbol: &str,
    now_ms: i64,
) -> Admission {
    let Some(quote_volume) = snapshot.quote_volume(symbol) else {
        return Admission::NoTicker;
    };
    if quote_volume < thresholds.min_quote_volume {
        return Admission::LowVolume;
    }

    let Some(listed_at) = snapshot.listing_time(symbol) else {
        return Admission::NoListing;
    };
    // Exactly min_listing_days old is still too young
    if now_ms.saturating_sub(listed_at) <= thresholds.min_listing_age_ms() {
        return Admission::TooYoung;
    }

    let open_interest = snapshot.open_interest(symbol).unwrap_or(0.0);
    if open_interest < thresholds.min_open_interest {
        return Admission::LowOpenInterest;
    }

    Admission::Admitted
}

/// Keep the admitted candidates in their given order, at most `limit` of
/// them (`0` = no limit).
pub fn clean_coins<S: AsRef<str>>(
    snapshot: &MarketSnapshot,
    thresholds: &FilterConfig,
    candidates: &[S],
    limit: usize,
    now_ms: i64,
) -> Vec<String> {
    let cap = if limit == 0 { usize::MAX } else { limit };

    candidates
        .iter()
        .map(|c| c.as_ref().trim().to_ascii_uppercase())
        .filter(|symbol| {
            let verdict = admission(snapshot, thresholds, symbol, now_ms);
            trace!(%symbol, %verdict, "Evaluated candidate");
            verdict.is_admitted()
        })
        .take(cap)
        .collect()
}

/// Verdict for every candidate, in input order
pub fn explain<S: AsRef<str>>(
    snapshot: &MarketSnapshot,
    thresholds: &FilterConfig,
    candidates: &[S],
    now_ms: i64,
) -> Vec<(String, Admission)> {
    candidates
        .iter()
        .map(|c| {
            let symbol = c.as_ref().trim().to_ascii_uppercase();
            let verdict = admission(snapshot, thresholds, &symbol, now_ms);
            (symbol, verdict)
        })
        .collect()
}
