//! Read contract consumed by dashboards.

use crate::aggregate::{build_view, ViewParams};
use crate::service::{CycleSnapshot, ScannerService};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::types::{CombinedFundingRate, Opportunity, OpportunityStats};
use serde::Serialize;

/// One refresh as presented to the caller: costed, filtered and summarised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshResponse {
    pub opportunities: Vec<Opportunity>,
    pub stats: OpportunityStats,
    pub funding_rates: Vec<CombinedFundingRate>,
    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// Runs a full refresh cycle and presents it with `params`.
    async fn refresh(&self, params: &ViewParams) -> Result<RefreshResponse>;

    /// Re-presents an earlier cycle with different parameters, without I/O.
    fn view(&self, cycle: &CycleSnapshot, params: &ViewParams) -> Result<RefreshResponse> {
        params.validate()?;
        let (opportunities, stats) = build_view(&cycle.opportunities, params, cycle.timestamp);
        Ok(RefreshResponse {
            opportunities,
            stats,
            funding_rates: cycle.funding_rates.clone(),
            timestamp: cycle.timestamp,
        })
    }
}

#[async_trait]
impl DashboardApi for ScannerService {
    async fn refresh(&self, params: &ViewParams) -> Result<RefreshResponse> {
        params.validate()?;
        let cycle = self.run_cycle(Utc::now()).await?;
        self.view(&cycle, params)
    }
}
