//! Gate USDT-settled perpetual futures.

use crate::http::{get_json, parse_f64, parse_price};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::types::{Exchange, FundingSnapshot};
use exchange_adapter_trait::{
    next_slot_boundary, sanitize_interval_hours, timestamp_secs_to_utc, ExchangeAdapter,
};
use reqwest::Client;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://api.gateio.ws";

/// Gate publishes everything needed in one contract listing.
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct Contract {
    name: String,
    #[serde(default)]
    funding_rate: String,
    /// Seconds between settlements.
    #[serde(default)]
    funding_interval: f64,
    /// Unix seconds of the next settlement.
    #[serde(default)]
    funding_next_apply: f64,
    #[serde(default)]
    mark_price: String,
    #[serde(default)]
    in_delisting: bool,
}

pub struct GateAdapter {
    client: Client,
    base_url: String,
}

impl GateAdapter {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ExchangeAdapter for GateAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Gate
    }

    async fn fetch_snapshots(&self) -> Result<Vec<FundingSnapshot>> {
        let url = format!("{}/api/v4/futures/usdt/contracts", self.base_url);
        let contracts = get_json::<Vec<Contract>>(&self.client, &url)
            .await
            .context("Gate contracts")?;
        Ok(build_snapshots(contracts, Utc::now()))
    }
}

pub(crate) fn build_snapshots(rows: Vec<Contract>, now: DateTime<Utc>) -> Vec<FundingSnapshot> {
    rows.into_iter()
        .filter(|row| row.name.ends_with("_USDT") && !row.in_delisting)
        .filter_map(|row| {
            let Some(rate) = parse_f64(&row.funding_rate) else {
                tracing::debug!(symbol = %row.name, "Skipping Gate contract without funding rate");
                return None;
            };
            let interval = sanitize_interval_hours(row.funding_interval / 3600.0);
            let next_funding_time = Some(row.funding_next_apply)
                .filter(|secs| secs.is_finite() && *secs > 0.0)
                .and_then(|secs| timestamp_secs_to_utc(secs as i64))
                .unwrap_or_else(|| next_slot_boundary(now, interval));
            Some(FundingSnapshot {
                exchange: Exchange::Gate,
                funding_rate: rate,
                funding_interval_hours: interval,
                next_funding_time,
                mark_price: parse_price(&row.mark_price),
                fetched_at: now,
                symbol: row.name,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::decode;
    use chrono::TimeZone;

    const CONTRACTS: &str = r#"[
        {"name":"BTC_USDT","type":"direct","funding_rate":"0.000084","funding_interval":28800,"funding_next_apply":1710057600,"mark_price":"64005.3","in_delisting":false},
        {"name":"ORDI_USDT","type":"direct","funding_rate":"-0.0011","funding_interval":14400,"funding_next_apply":1710043200.0,"mark_price":"70.1","in_delisting":false},
        {"name":"OLD_USDT","type":"direct","funding_rate":"0.0001","funding_interval":28800,"funding_next_apply":1710057600,"mark_price":"1","in_delisting":true},
        {"name":"ODD_USDT","type":"direct","funding_rate":"0.0001","funding_interval":0,"funding_next_apply":0,"mark_price":"1","in_delisting":false},
        {"name":"NEW_USDT","type":"direct","funding_rate":"","funding_interval":28800,"funding_next_apply":0,"mark_price":"1","in_delisting":false},
        {"name":"HUGE_USDT","type":"direct","funding_rate":"0.0002","funding_interval":1e20,"funding_next_apply":0,"mark_price":"1","in_delisting":false}
    ]"#;

    #[test]
    fn test_build_snapshots() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 3, 0, 0).unwrap();
        let rows: Vec<Contract> = decode("contracts", CONTRACTS).unwrap();
        let snapshots = build_snapshots(rows, now);

        let symbols: Vec<_> = snapshots.iter().map(|s| s.symbol.as_str()).collect();
        // NEW_USDT has no rate yet and is skipped on its own.
        assert_eq!(symbols, vec!["BTC_USDT", "ORDI_USDT", "ODD_USDT", "HUGE_USDT"]);
        assert_eq!(snapshots[0].funding_interval_hours, 8.0);
        assert_eq!(snapshots[1].funding_interval_hours, 4.0);
        assert_eq!(
            snapshots[1].next_funding_time,
            Utc.with_ymd_and_hms(2024, 3, 10, 4, 0, 0).unwrap()
        );
        // Zero interval falls back to the default, next funding from the slot grid.
        assert_eq!(snapshots[2].funding_interval_hours, 8.0);
        assert_eq!(
            snapshots[2].next_funding_time,
            Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap()
        );
        // An absurd interval still lands on a real settlement time.
        assert_eq!(
            snapshots[3].next_funding_time,
            Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap()
        );
    }
}
