use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Number of derivatives venues the scanner knows about.
pub const EXCHANGE_COUNT: usize = 7;

/// Basis points per unit of funding rate.
pub const BPS_PER_UNIT: f64 = 10_000.0;

/// Hours in a (non-leap) year, used for annualization.
pub const HOURS_PER_YEAR: f64 = 8_760.0;

/// A derivatives venue publishing perpetual funding rates.
///
/// The declaration order is the canonical venue order: it fixes slot indices in
/// [`CombinedFundingRate`] and the merge order across adapters.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Binance,
    Bybit,
    Bitget,
    Gate,
    Mexc,
    Hyperliquid,
    Dydx,
}

impl Exchange {
    /// All venues in canonical order.
    pub const ALL: [Exchange; EXCHANGE_COUNT] = [
        Exchange::Binance,
        Exchange::Bybit,
        Exchange::Bitget,
        Exchange::Gate,
        Exchange::Mexc,
        Exchange::Hyperliquid,
        Exchange::Dydx,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Binance => "binance",
            Exchange::Bybit => "bybit",
            Exchange::Bitget => "bitget",
            Exchange::Gate => "gate",
            Exchange::Mexc => "mexc",
            Exchange::Hyperliquid => "hyperliquid",
            Exchange::Dydx => "dydx",
        }
    }

    /// Slot index of this venue in a [`CombinedFundingRate`].
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl std::str::FromStr for Exchange {
    type Err = crate::errors::FundingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Exchange::ALL
            .iter()
            .copied()
            .find(|e| e.as_str() == wanted)
            .ok_or_else(|| {
                crate::errors::FundingError::ConfigurationError(format!("unknown exchange: {}", s))
            })
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a price, typically using a high-precision decimal type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One venue's current funding state for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingSnapshot {
    /// Venue-native instrument symbol, e.g. `BTCUSDT` or `BTC-USD`.
    pub symbol: String,
    pub exchange: Exchange,
    /// Funding rate per interval, as a fraction of notional.
    pub funding_rate: f64,
    pub funding_interval_hours: f64,
    pub next_funding_time: DateTime<Utc>,
    pub mark_price: Option<Price>,
    pub fetched_at: DateTime<Utc>,
}

impl FundingSnapshot {
    pub fn rate_bps(&self) -> f64 {
        self.funding_rate * BPS_PER_UNIT
    }
}

/// Every venue's snapshot for one normalized symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedFundingRate {
    /// Canonical symbol, see [`crate::symbol::normalize_symbol`].
    pub symbol: String,
    /// One slot per venue, indexed by [`Exchange::index`].
    pub rates: [Option<FundingSnapshot>; EXCHANGE_COUNT],
    pub updated_at: DateTime<Utc>,
}

impl CombinedFundingRate {
    pub fn new(symbol: impl Into<String>, updated_at: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            rates: Default::default(),
            updated_at,
        }
    }

    pub fn get(&self, exchange: Exchange) -> Option<&FundingSnapshot> {
        self.rates[exchange.index()].as_ref()
    }

    /// Fills the snapshot's own venue slot. An occupied slot is left untouched
    /// and `false` is returned.
    pub fn fill(&mut self, snapshot: FundingSnapshot) -> bool {
        let slot = &mut self.rates[snapshot.exchange.index()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(snapshot);
        true
    }

    /// Venues with a filled slot, in canonical order.
    pub fn exchanges(&self) -> impl Iterator<Item = Exchange> + '_ {
        Exchange::ALL
            .into_iter()
            .filter(move |e| self.rates[e.index()].is_some())
    }
}

/// An unordered venue pair in its canonical orientation (`a` before `b`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExchangePair {
    pub a: Exchange,
    pub b: Exchange,
}

impl ExchangePair {
    pub const fn new(a: Exchange, b: Exchange) -> Self {
        Self { a, b }
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.a, self.b)
    }

    pub fn contains(&self, exchange: Exchange) -> bool {
        self.a == exchange || self.b == exchange
    }

    /// True when both endpoints are in `selected`.
    pub fn is_within(&self, selected: &BTreeSet<Exchange>) -> bool {
        selected.contains(&self.a) && selected.contains(&self.b)
    }
}

impl fmt::Display for ExchangePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.a, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpportunityType {
    /// Both venues settle at effectively the same instant.
    RateArbitrage,
    /// Venues settle at different instants; only the sooner rate is captured.
    IntervalMismatch,
}

impl fmt::Display for OpportunityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A scored funding arbitrage between two venues on one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub symbol: String,
    pub exchange_pair: ExchangePair,
    #[serde(rename = "type")]
    pub opportunity_type: OpportunityType,
    pub exchange_a_rate: f64,
    pub exchange_b_rate: f64,
    pub exchange_a_interval_hours: f64,
    pub exchange_b_interval_hours: f64,
    pub exchange_a_next_funding: DateTime<Utc>,
    pub exchange_b_next_funding: DateTime<Utc>,
    /// Effective spread captured by the trade, in basis points.
    pub rate_spread_bps: f64,
    pub annualized_return_pct: f64,
    pub short_exchange: Exchange,
    pub long_exchange: Exchange,
    /// Negative once the settlement has passed.
    pub time_to_funding_a_secs: i64,
    pub time_to_funding_b_secs: i64,
    pub is_in_entry_window: bool,
    pub spread_cost_bps: Option<f64>,
    pub net_profit_bps: Option<f64>,
    pub detected_at: DateTime<Utc>,
}

impl Opportunity {
    /// Seconds until the first of the two legs settles.
    pub fn soonest_funding_secs(&self) -> i64 {
        self.time_to_funding_a_secs.min(self.time_to_funding_b_secs)
    }

    pub fn is_profitable(&self) -> bool {
        self.net_profit_bps.map_or(false, |net| net > 0.0)
    }
}

/// Summary of one (possibly filtered) opportunity set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityStats {
    pub total_opportunities: usize,
    pub rate_arbitrage_count: usize,
    pub interval_mismatch_count: usize,
    pub in_entry_window_count: usize,
    pub profitable_count: usize,
    /// Opportunity count keyed by [`ExchangePair::label`].
    pub by_pair: BTreeMap<String, usize>,
    pub best_opportunity: Option<Opportunity>,
    /// `None` when the set is empty.
    pub average_spread_bps: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

impl OpportunityStats {
    pub fn empty(updated_at: DateTime<Utc>) -> Self {
        Self {
            total_opportunities: 0,
            rate_arbitrage_count: 0,
            interval_mismatch_count: 0,
            in_entry_window_count: 0,
            profitable_count: 0,
            by_pair: BTreeMap::new(),
            best_opportunity: None,
            average_spread_bps: None,
            updated_at,
        }
    }
}
