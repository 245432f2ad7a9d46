//! Joins per-venue snapshot lists into one record per canonical symbol.

use anyhow::{ensure, Result};
use chrono::{DateTime, Utc};
use common::symbol::normalize_symbol;
use common::types::{CombinedFundingRate, Exchange, FundingSnapshot};
use common::FundingError;
use std::collections::HashMap;

/// Merges adapter results, processed in canonical venue order regardless of
/// the order they arrive in. Records appear in first-sight order. A venue
/// reporting two spellings of one symbol keeps the first.
pub fn merge(
    mut results: Vec<(Exchange, Vec<FundingSnapshot>)>,
    updated_at: DateTime<Utc>,
) -> Result<Vec<CombinedFundingRate>> {
    results.sort_by_key(|(exchange, _)| *exchange);

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<CombinedFundingRate> = Vec::new();

    for (exchange, snapshots) in results {
        for snapshot in snapshots {
            ensure!(
                snapshot.exchange == exchange,
                FundingError::Internal(format!(
                    "{} snapshot for {} returned by the {} adapter",
                    snapshot.exchange, snapshot.symbol, exchange
                ))
            );
            let key = normalize_symbol(&snapshot.symbol);
            let slot = match index.get(&key) {
                Some(slot) => *slot,
                None => {
                    merged.push(CombinedFundingRate::new(key.clone(), updated_at));
                    index.insert(key, merged.len() - 1);
                    merged.len() - 1
                }
            };
            let symbol = snapshot.symbol.clone();
            if !merged[slot].fill(snapshot) {
                log::debug!(
                    "Ignoring duplicate {} symbol {} for {}",
                    exchange,
                    symbol,
                    merged[slot].symbol
                );
            }
        }
    }

    Ok(merged)
}
