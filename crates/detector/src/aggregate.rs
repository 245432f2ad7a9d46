//! Cost model, venue filter and summary statistics.
//!
//! Everything here is synchronous and side-effect free, so a dashboard can
//! re-apply a different cost or venue selection to the last classified set
//! without fetching again.

use chrono::{DateTime, Utc};
use common::types::{Exchange, Opportunity, OpportunityStats, OpportunityType};
use common::FundingError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Round-trip trading cost assumed when the caller does not pick one.
pub const DEFAULT_SPREAD_COST_BPS: u32 = 20;

/// Caller-tunable presentation of a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewParams {
    pub spread_cost_bps: u32,
    pub exchanges: BTreeSet<Exchange>,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            spread_cost_bps: DEFAULT_SPREAD_COST_BPS,
            exchanges: Exchange::ALL.into_iter().collect(),
        }
    }
}

impl ViewParams {
    pub fn validate(&self) -> Result<(), FundingError> {
        if self.exchanges.is_empty() {
            return Err(FundingError::ConfigurationError(
                "at least one exchange must be selected".to_string(),
            ));
        }
        Ok(())
    }
}

fn net_of(opportunity: &Opportunity) -> f64 {
    opportunity
        .net_profit_bps
        .unwrap_or(opportunity.rate_spread_bps)
}

/// Best first: `net_profit_bps` descending, then symbol, then pair-table order.
pub fn ranking_order(x: &Opportunity, y: &Opportunity) -> Ordering {
    net_of(y)
        .total_cmp(&net_of(x))
        .then_with(|| x.symbol.cmp(&y.symbol))
        .then_with(|| x.exchange_pair.cmp(&y.exchange_pair))
}

pub fn rank(opportunities: &mut [Opportunity]) {
    opportunities.sort_by(ranking_order);
}

/// Charges `cost_bps` against every opportunity and re-ranks. Always computed
/// from `rate_spread_bps`, so applying a second cost replaces the first.
pub fn apply_spread_cost(opportunities: &[Opportunity], cost_bps: u32) -> Vec<Opportunity> {
    let cost = f64::from(cost_bps);
    let mut costed: Vec<Opportunity> = opportunities
        .iter()
        .cloned()
        .map(|mut o| {
            o.spread_cost_bps = Some(cost);
            o.net_profit_bps = Some(o.rate_spread_bps - cost);
            o
        })
        .collect();
    rank(&mut costed);
    costed
}

/// Keeps the opportunities whose two venues are both selected.
pub fn filter_by_exchanges(
    opportunities: &[Opportunity],
    selected: &BTreeSet<Exchange>,
) -> Vec<Opportunity> {
    opportunities
        .iter()
        .filter(|o| o.exchange_pair.is_within(selected))
        .cloned()
        .collect()
}

pub fn compute_stats(opportunities: &[Opportunity], now: DateTime<Utc>) -> OpportunityStats {
    if opportunities.is_empty() {
        return OpportunityStats::empty(now);
    }

    let mut by_pair: BTreeMap<String, usize> = BTreeMap::new();
    for o in opportunities {
        *by_pair.entry(o.exchange_pair.label()).or_default() += 1;
    }

    let count = |ty: OpportunityType| {
        opportunities
            .iter()
            .filter(|o| o.opportunity_type == ty)
            .count()
    };

    let best_opportunity = opportunities
        .iter()
        .min_by(|x, y| ranking_order(x, y))
        .cloned();

    let total_spread: f64 = opportunities.iter().map(|o| o.rate_spread_bps).sum();

    OpportunityStats {
        total_opportunities: opportunities.len(),
        rate_arbitrage_count: count(OpportunityType::RateArbitrage),
        interval_mismatch_count: count(OpportunityType::IntervalMismatch),
        in_entry_window_count: opportunities.iter().filter(|o| o.is_in_entry_window).count(),
        profitable_count: opportunities.iter().filter(|o| o.is_profitable()).count(),
        by_pair,
        best_opportunity,
        average_spread_bps: Some(total_spread / opportunities.len() as f64),
        updated_at: now,
    }
}

/// Filter, then cost, then statistics over what is left.
pub fn build_view(
    opportunities: &[Opportunity],
    params: &ViewParams,
    now: DateTime<Utc>,
) -> (Vec<Opportunity>, OpportunityStats) {
    let filtered = filter_by_exchanges(opportunities, &params.exchanges);
    let costed = apply_spread_cost(&filtered, params.spread_cost_bps);
    let stats = compute_stats(&costed, now);
    (costed, stats)
}
