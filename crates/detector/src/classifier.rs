//! Pairwise opportunity classification.
//!
//! For every merged symbol and every canonical venue pair with both legs
//! present, the classifier decides whether the legs settle together
//! ([`OpportunityType::RateArbitrage`]) or apart
//! ([`OpportunityType::IntervalMismatch`]), picks the short and long legs, and
//! scores the trade in basis points.

use crate::aggregate::rank;
use crate::pairs::EXCHANGE_PAIRS;
use anyhow::{ensure, Result};
use chrono::{DateTime, Utc};
use common::types::{
    CombinedFundingRate, ExchangePair, FundingSnapshot, Opportunity, OpportunityType,
    HOURS_PER_YEAR,
};
use common::FundingError;
use exchange_adapter_trait::DEFAULT_FUNDING_INTERVAL_HOURS;
use serde::{Deserialize, Serialize};

/// Classification thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Opportunities below this effective spread are discarded.
    pub min_spread_bps: f64,
    /// Legs whose settlements are closer than this are treated as simultaneous.
    pub same_funding_tolerance_secs: i64,
    /// How long before the first settlement an entry is still favourable.
    pub entry_window_secs: i64,
    /// Substituted for missing, zero or negative venue intervals.
    pub default_interval_hours: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_spread_bps: 3.0,
            same_funding_tolerance_secs: 300,
            entry_window_secs: 600,
            default_interval_hours: DEFAULT_FUNDING_INTERVAL_HOURS,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), FundingError> {
        if !self.min_spread_bps.is_finite() || self.min_spread_bps < 0.0 {
            return Err(FundingError::ConfigurationError(
                "min_spread_bps must be a non-negative number".to_string(),
            ));
        }
        if self.same_funding_tolerance_secs <= 0 {
            return Err(FundingError::ConfigurationError(
                "same_funding_tolerance_secs must be greater than 0".to_string(),
            ));
        }
        if self.entry_window_secs <= 0 {
            return Err(FundingError::ConfigurationError(
                "entry_window_secs must be greater than 0".to_string(),
            ));
        }
        if !self.default_interval_hours.is_finite() || self.default_interval_hours <= 0.0 {
            return Err(FundingError::ConfigurationError(
                "default_interval_hours must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    fn interval_or_default(&self, hours: f64) -> f64 {
        if hours.is_finite() && hours > 0.0 {
            hours
        } else {
            self.default_interval_hours
        }
    }
}

/// Classifies every symbol/pair combination and returns the qualifying
/// opportunities ranked by `net_profit_bps`, best first.
pub fn classify(
    records: &[CombinedFundingRate],
    config: &DetectorConfig,
    now: DateTime<Utc>,
) -> Result<Vec<Opportunity>> {
    let mut opportunities = Vec::new();

    for record in records {
        for pair in EXCHANGE_PAIRS {
            let (Some(a), Some(b)) = (record.get(pair.a), record.get(pair.b)) else {
                continue;
            };
            if let Some(opportunity) = classify_pair(&record.symbol, pair, a, b, config, now) {
                ensure!(
                    opportunity.short_exchange != opportunity.long_exchange,
                    FundingError::Internal(format!(
                        "{} {}: short and long legs are both {}",
                        record.symbol, pair, opportunity.short_exchange
                    ))
                );
                opportunities.push(opportunity);
            }
        }
    }

    rank(&mut opportunities);
    log::debug!(
        "Classified {} opportunities across {} symbols",
        opportunities.len(),
        records.len()
    );
    Ok(opportunities)
}

/// Scores one venue pair on one symbol. `a` and `b` must be the snapshots of
/// `pair.a` and `pair.b`. Returns `None` below the spread threshold.
pub fn classify_pair(
    symbol: &str,
    pair: ExchangePair,
    a: &FundingSnapshot,
    b: &FundingSnapshot,
    config: &DetectorConfig,
    now: DateTime<Utc>,
) -> Option<Opportunity> {
    let rate_a_bps = a.rate_bps();
    let rate_b_bps = b.rate_bps();
    let time_to_funding_a = (a.next_funding_time - now).num_seconds();
    let time_to_funding_b = (b.next_funding_time - now).num_seconds();

    let simultaneous =
        (time_to_funding_a - time_to_funding_b).abs() < config.same_funding_tolerance_secs;

    let (opportunity_type, spread_bps, short_exchange, long_exchange) = if simultaneous {
        // Short the venue paying more, long the one paying less.
        let spread = (rate_a_bps - rate_b_bps).abs();
        if rate_a_bps >= rate_b_bps {
            (OpportunityType::RateArbitrage, spread, pair.a, pair.b)
        } else {
            (OpportunityType::RateArbitrage, spread, pair.b, pair.a)
        }
    } else {
        let (sooner, sooner_bps, later) = if time_to_funding_a < time_to_funding_b {
            (pair.a, rate_a_bps, pair.b)
        } else {
            (pair.b, rate_b_bps, pair.a)
        };
        // Positive funding is paid by longs to shorts.
        if sooner_bps > 0.0 {
            (OpportunityType::IntervalMismatch, sooner_bps.abs(), sooner, later)
        } else {
            (OpportunityType::IntervalMismatch, sooner_bps.abs(), later, sooner)
        }
    };

    // Negated so that a NaN spread is discarded too.
    if !(spread_bps >= config.min_spread_bps) {
        return None;
    }

    let interval_a = config.interval_or_default(a.funding_interval_hours);
    let interval_b = config.interval_or_default(b.funding_interval_hours);
    let annualized_return_pct = spread_bps * (HOURS_PER_YEAR / interval_a.min(interval_b)) / 100.0;

    let mut opportunity = Opportunity {
        symbol: symbol.to_string(),
        exchange_pair: pair,
        opportunity_type,
        exchange_a_rate: a.funding_rate,
        exchange_b_rate: b.funding_rate,
        exchange_a_interval_hours: interval_a,
        exchange_b_interval_hours: interval_b,
        exchange_a_next_funding: a.next_funding_time,
        exchange_b_next_funding: b.next_funding_time,
        rate_spread_bps: spread_bps,
        annualized_return_pct,
        short_exchange,
        long_exchange,
        time_to_funding_a_secs: time_to_funding_a,
        time_to_funding_b_secs: time_to_funding_b,
        is_in_entry_window: false,
        spread_cost_bps: None,
        net_profit_bps: Some(spread_bps),
        detected_at: now,
    };
    let soonest = opportunity.soonest_funding_secs();
    opportunity.is_in_entry_window = soonest > 0 && soonest <= config.entry_window_secs;
    Some(opportunity)
}
