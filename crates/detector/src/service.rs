use crate::classifier::{classify, DetectorConfig};
use crate::merge::merge;
use anyhow::Result;
use chrono::{DateTime, Utc};
use common::types::{CombinedFundingRate, Exchange, FundingSnapshot, Opportunity};
use exchange_adapter_trait::ExchangeAdapters;
use futures::future::join_all;
use serde::Serialize;

/// The result of one fetch-merge-classify pass, before any cost or venue
/// filter has been applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleSnapshot {
    /// Ranked by raw spread; `spread_cost_bps` is still unset.
    pub opportunities: Vec<Opportunity>,
    pub funding_rates: Vec<CombinedFundingRate>,
    pub timestamp: DateTime<Utc>,
}

/// Stateless refresh cycle over a fixed adapter registry.
pub struct ScannerService {
    config: DetectorConfig,
    adapters: ExchangeAdapters,
}

impl ScannerService {
    pub fn new(config: DetectorConfig, adapters: ExchangeAdapters) -> Self {
        Self { config, adapters }
    }

    pub fn exchanges(&self) -> Vec<Exchange> {
        self.adapters.iter().map(|a| a.exchange()).collect()
    }

    /// Fetches every venue concurrently, waits for all of them, then merges
    /// and classifies. A venue that fails contributes nothing.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleSnapshot> {
        let results = self.fetch_all().await;
        self.process(results, now)
    }

    async fn fetch_all(&self) -> Vec<(Exchange, Vec<FundingSnapshot>)> {
        let handles = self.adapters.iter().map(|adapter| {
            let adapter = adapter.clone();
            let exchange = adapter.exchange();
            (exchange, tokio::spawn(async move { adapter.fetch().await }))
        });
        let (exchanges, tasks): (Vec<_>, Vec<_>) = handles.unzip();

        exchanges
            .into_iter()
            .zip(join_all(tasks).await)
            .map(|(exchange, joined)| match joined {
                Ok(snapshots) => (exchange, snapshots),
                Err(e) => {
                    log::error!("{} fetch task aborted: {}", exchange, e);
                    (exchange, Vec::new())
                }
            })
            .collect()
    }

    /// Merge and classify already fetched venue results.
    pub fn process(
        &self,
        results: Vec<(Exchange, Vec<FundingSnapshot>)>,
        now: DateTime<Utc>,
    ) -> Result<CycleSnapshot> {
        let responding = results.iter().filter(|(_, s)| !s.is_empty()).count();
        let funding_rates = merge(results, now)?;
        let opportunities = classify(&funding_rates, &self.config, now)?;
        log::info!(
            "Cycle at {}: {} venues responded, {} symbols, {} opportunities",
            now,
            responding,
            funding_rates.len(),
            opportunities.len()
        );
        Ok(CycleSnapshot {
            opportunities,
            funding_rates,
            timestamp: now,
        })
    }
}
