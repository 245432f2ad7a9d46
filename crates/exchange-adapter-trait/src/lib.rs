use anyhow::Result;
use async_trait::async_trait;
use common::types::{Exchange, FundingSnapshot};
use common::FundingError;
use std::sync::Arc;

pub mod schedule;

pub use schedule::{
    next_slot_boundary, sanitize_interval_hours, timestamp_millis_to_utc, timestamp_secs_to_utc,
    DEFAULT_FUNDING_INTERVAL_HOURS,
};

/// Flat adapter registry, fetched concurrently each cycle.
pub type ExchangeAdapters = Vec<Arc<dyn ExchangeAdapter>>;

#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    /// Returns the venue served by this adapter.
    fn exchange(&self) -> Exchange;

    /// Fetches the venue's current funding snapshots, settlement-filtered.
    async fn fetch_snapshots(&self) -> Result<Vec<FundingSnapshot>>;

    /// Fetches snapshots and absorbs any failure into an empty result.
    async fn fetch(&self) -> Vec<FundingSnapshot> {
        match self.fetch_snapshots().await {
            Ok(snapshots) => {
                tracing::debug!(
                    exchange = %self.exchange(),
                    count = snapshots.len(),
                    "Fetched funding snapshots"
                );
                snapshots
            }
            Err(e) => {
                let expected = e
                    .downcast_ref::<FundingError>()
                    .map_or(false, FundingError::is_adapter_level);
                if expected {
                    tracing::warn!(
                        exchange = %self.exchange(),
                        error = %format!("{:#}", e),
                        "Funding fetch failed, venue skipped for this cycle"
                    );
                } else {
                    tracing::error!(
                        exchange = %self.exchange(),
                        error = %format!("{:#}", e),
                        "Unexpected adapter error, venue skipped for this cycle"
                    );
                }
                Vec::new()
            }
        }
    }
}
