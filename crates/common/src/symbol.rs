//! Canonical instrument keys.

/// Settlement suffixes stripped from symbols, longest first.
const SETTLEMENT_SUFFIXES: [&str; 3] = ["USDT", "USDC", "USD"];

/// Perpetual markers some venues append after the settlement currency.
const CONTRACT_MARKERS: [&str; 2] = ["PERP", "SWAP"];

/// Collapses a venue-specific symbol to the canonical merge key.
///
/// `BTCUSDT`, `BTC_USDT`, `BTC-USD`, `btc-usdt-swap` and `BTC` all map to `BTC`.
pub fn normalize_symbol(raw: &str) -> String {
    let compact: String = raw
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | '/' | ':' | ' '))
        .flat_map(char::to_uppercase)
        .collect();

    let mut key = compact.as_str();
    for marker in CONTRACT_MARKERS {
        if let Some(stripped) = key.strip_suffix(marker) {
            if !stripped.is_empty() {
                key = stripped;
                break;
            }
        }
    }
    for suffix in SETTLEMENT_SUFFIXES {
        if let Some(stripped) = key.strip_suffix(suffix) {
            if !stripped.is_empty() {
                key = stripped;
                break;
            }
        }
    }
    key.to_string()
}
