//! Flat adapter registry, one entry per venue in canonical order.

use crate::venues::{
    BinanceAdapter, BitgetAdapter, BybitAdapter, DydxAdapter, GateAdapter, HyperliquidAdapter,
    MexcAdapter,
};
use common::types::Exchange;
use exchange_adapter_trait::{ExchangeAdapter, ExchangeAdapters};
use reqwest::Client;
use std::sync::Arc;

/// Creates the adapter for `exchange`, optionally against a non-default base URL.
pub fn build_adapter(
    exchange: Exchange,
    client: Client,
    base_url: Option<&str>,
) -> Arc<dyn ExchangeAdapter> {
    macro_rules! adapter {
        ($ty:ident) => {
            match base_url {
                Some(url) => Arc::new($ty::with_base_url(client, url)) as Arc<dyn ExchangeAdapter>,
                None => Arc::new($ty::new(client)),
            }
        };
    }
    match exchange {
        Exchange::Binance => adapter!(BinanceAdapter),
        Exchange::Bybit => adapter!(BybitAdapter),
        Exchange::Bitget => adapter!(BitgetAdapter),
        Exchange::Gate => adapter!(GateAdapter),
        Exchange::Mexc => adapter!(MexcAdapter),
        Exchange::Hyperliquid => adapter!(HyperliquidAdapter),
        Exchange::Dydx => adapter!(DydxAdapter),
    }
}

/// All seven venues with their public endpoints.
pub fn default_registry(client: Client) -> ExchangeAdapters {
    Exchange::ALL
        .iter()
        .map(|exchange| build_adapter(*exchange, client.clone(), None))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{build_client, DEFAULT_TIMEOUT};

    #[test]
    fn test_default_registry_covers_all_venues_in_order() {
        let client = build_client(DEFAULT_TIMEOUT).unwrap();
        let registry = default_registry(client);
        let venues: Vec<_> = registry.iter().map(|a| a.exchange()).collect();
        assert_eq!(venues, Exchange::ALL.to_vec());
    }

    #[test]
    fn test_build_adapter_with_override() {
        let client = build_client(DEFAULT_TIMEOUT).unwrap();
        let adapter = build_adapter(Exchange::Gate, client, Some("http://127.0.0.1:9"));
        assert_eq!(adapter.exchange(), Exchange::Gate);
    }

    #[tokio::test]
    async fn test_unreachable_venue_yields_empty_result() {
        let client = build_client(std::time::Duration::from_millis(500)).unwrap();
        let adapter = build_adapter(Exchange::Dydx, client, Some("http://127.0.0.1:9"));
        assert!(adapter.fetch_snapshots().await.is_err());
        assert!(adapter.fetch().await.is_empty());
    }
}
