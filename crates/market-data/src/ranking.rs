//! Top-volume projection over the ticker map

use crate::cache::MarketSnapshot;

/// Symbols ending with `quote_asset`, highest 24h quote volume first, at most
/// `limit` of them (`0` = no limit). Ties come out in no particular order.
pub fn top_volume(snapshot: &MarketSnapshot, quote_asset: &str, limit: usize) -> Vec<String> {
    let mut ranked: Vec<(&str, f64)> = snapshot
        .tickers
        .iter()
        .filter(|(symbol, _)| symbol.ends_with(quote_asset))
        .map(|(symbol, ticker)| (symbol.as_str(), ticker.quote_volume))
        .collect();

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    if limit > 0 {
        ranked.truncate(limit);
    }

    ranked.into_iter().map(|(s, _)| s.to_string()).collect()
}
