//! Canonical venue pair table.

use common::types::{Exchange, ExchangePair, EXCHANGE_COUNT};

/// Number of unordered pairs of distinct venues.
pub const PAIR_COUNT: usize = EXCHANGE_COUNT * (EXCHANGE_COUNT - 1) / 2;

/// Every unordered venue pair, each listed once. The `a`/`b` orientation is
/// fixed here and determines the `exchange_a`/`exchange_b` sides of an
/// opportunity.
pub const EXCHANGE_PAIRS: [ExchangePair; PAIR_COUNT] = [
    ExchangePair::new(Exchange::Binance, Exchange::Bybit),
    ExchangePair::new(Exchange::Binance, Exchange::Bitget),
    ExchangePair::new(Exchange::Binance, Exchange::Gate),
    ExchangePair::new(Exchange::Binance, Exchange::Mexc),
    ExchangePair::new(Exchange::Binance, Exchange::Hyperliquid),
    ExchangePair::new(Exchange::Binance, Exchange::Dydx),
    ExchangePair::new(Exchange::Bybit, Exchange::Bitget),
    ExchangePair::new(Exchange::Bybit, Exchange::Gate),
    ExchangePair::new(Exchange::Bybit, Exchange::Mexc),
    ExchangePair::new(Exchange::Bybit, Exchange::Hyperliquid),
    ExchangePair::new(Exchange::Bybit, Exchange::Dydx),
    ExchangePair::new(Exchange::Bitget, Exchange::Gate),
    ExchangePair::new(Exchange::Bitget, Exchange::Mexc),
    ExchangePair::new(Exchange::Bitget, Exchange::Hyperliquid),
    ExchangePair::new(Exchange::Bitget, Exchange::Dydx),
    ExchangePair::new(Exchange::Gate, Exchange::Mexc),
    ExchangePair::new(Exchange::Gate, Exchange::Hyperliquid),
    ExchangePair::new(Exchange::Gate, Exchange::Dydx),
    ExchangePair::new(Exchange::Mexc, Exchange::Hyperliquid),
    ExchangePair::new(Exchange::Mexc, Exchange::Dydx),
    ExchangePair::new(Exchange::Hyperliquid, Exchange::Dydx),
];
