//! Binance USDⓈ-M perpetuals.

use crate::http::{get_json, parse_f64, parse_price};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::types::{Exchange, FundingSnapshot};
use exchange_adapter_trait::{
    next_slot_boundary, sanitize_interval_hours, timestamp_millis_to_utc, ExchangeAdapter,
    DEFAULT_FUNDING_INTERVAL_HOURS,
};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

pub const DEFAULT_BASE_URL: &str = "https://fapi.binance.com";

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PremiumIndex {
    symbol: String,
    mark_price: String,
    last_funding_rate: String,
    #[serde(default)]
    next_funding_time: i64,
}

/// Only symbols with a non-default schedule are listed here.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FundingInfo {
    symbol: String,
    funding_interval_hours: f64,
}

pub struct BinanceAdapter {
    client: Client,
    base_url: String,
}

impl BinanceAdapter {
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
impl ExchangeAdapter for BinanceAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Binance
    }

    async fn fetch_snapshots(&self) -> Result<Vec<FundingSnapshot>> {
        let premium_url = format!("{}/fapi/v1/premiumIndex", self.base_url);
        let info_url = format!("{}/fapi/v1/fundingInfo", self.base_url);
        let (premium, info) = tokio::join!(
            get_json::<Vec<PremiumIndex>>(&self.client, &premium_url),
            get_json::<Vec<FundingInfo>>(&self.client, &info_url),
        );
        combine_responses(premium, info, Utc::now())
    }
}

/// Only a failed premium index call fails the venue; without funding info
/// every symbol gets the default interval.
pub(crate) fn combine_responses(
    premium: Result<Vec<PremiumIndex>>,
    info: Result<Vec<FundingInfo>>,
    now: DateTime<Utc>,
) -> Result<Vec<FundingSnapshot>> {
    let premium = premium.context("Binance premium index")?;
    let intervals = match info {
        Ok(rows) => interval_table(rows),
        Err(e) => {
            tracing::debug!(error = %e, "Binance funding info unavailable, using default intervals");
            HashMap::new()
        }
    };
    Ok(build_snapshots(premium, &intervals, now))
}

fn interval_table(rows: Vec<FundingInfo>) -> HashMap<String, f64> {
    rows.into_iter()
        .map(|row| (row.symbol, row.funding_interval_hours))
        .collect()
}

pub(crate) fn build_snapshots(
    rows: Vec<PremiumIndex>,
    intervals: &HashMap<String, f64>,
    now: DateTime<Utc>,
) -> Vec<FundingSnapshot> {
    rows.into_iter()
        .filter(|row| row.symbol.ends_with("USDT"))
        .filter_map(|row| {
            let Some(rate) = parse_f64(&row.last_funding_rate) else {
                tracing::debug!(symbol = %row.symbol, "Skipping Binance row without funding rate");
                return None;
            };
            let interval = sanitize_interval_hours(
                intervals
                    .get(&row.symbol)
                    .copied()
                    .unwrap_or(DEFAULT_FUNDING_INTERVAL_HOURS),
            );
            let next_funding_time = Some(row.next_funding_time)
                .filter(|ms| *ms > 0)
                .and_then(timestamp_millis_to_utc)
                .unwrap_or_else(|| next_slot_boundary(now, interval));
            Some(FundingSnapshot {
                exchange: Exchange::Binance,
                funding_rate: rate,
                funding_interval_hours: interval,
                next_funding_time,
                mark_price: parse_price(&row.mark_price),
                fetched_at: now,
                symbol: row.symbol,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::decode;
    use chrono::TimeZone;
    use common::FundingError;

    const PREMIUM: &str = r#"[
        {"symbol":"BTCUSDT","markPrice":"64012.50000000","indexPrice":"64000.1","lastFundingRate":"0.00010000","nextFundingTime":1710057600000,"interestRate":"0.0001","time":1710050000000},
        {"symbol":"ETHUSDC","markPrice":"3100.1","indexPrice":"3100","lastFundingRate":"0.00005","nextFundingTime":1710057600000,"interestRate":"0.0001","time":1710050000000},
        {"symbol":"AXLUSDT","markPrice":"1.2","indexPrice":"1.2","lastFundingRate":"-0.00030000","nextFundingTime":1710043200000,"interestRate":"0.0001","time":1710050000000},
        {"symbol":"BTCUSDT_240628","markPrice":"65000","indexPrice":"64000","lastFundingRate":"","nextFundingTime":0,"interestRate":"","time":1710050000000}
    ]"#;

    const INFO: &str = r#"[
        {"symbol":"AXLUSDT","adjustedFundingRateCap":"0.03","adjustedFundingRateFloor":"-0.03","fundingIntervalHours":4,"disclaimer":false}
    ]"#;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 5, 0, 0).unwrap()
    }

    #[test]
    fn test_build_snapshots_filters_and_joins_intervals() {
        let rows: Vec<PremiumIndex> = decode("premiumIndex", PREMIUM).unwrap();
        let intervals = interval_table(decode("fundingInfo", INFO).unwrap());
        let snapshots = build_snapshots(rows, &intervals, now());

        assert_eq!(snapshots.len(), 2);
        let btc = &snapshots[0];
        assert_eq!(btc.symbol, "BTCUSDT");
        assert_eq!(btc.funding_rate, 0.0001);
        assert_eq!(btc.funding_interval_hours, 8.0);
        assert_eq!(btc.next_funding_time, Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap());
        assert!(btc.mark_price.is_some());

        let axl = &snapshots[1];
        assert_eq!(axl.funding_interval_hours, 4.0);
        assert_eq!(axl.funding_rate, -0.0003);
    }

    #[test]
    fn test_funding_info_failure_falls_back_to_default_interval() {
        let rows: Vec<PremiumIndex> = decode("premiumIndex", PREMIUM).unwrap();
        let info = Err(FundingError::NetworkFailure("fundingInfo timed out".to_string()).into());
        let snapshots = combine_responses(Ok(rows), info, now()).unwrap();

        assert_eq!(snapshots.len(), 2);
        assert!(snapshots.iter().all(|s| s.funding_interval_hours == 8.0));
    }

    #[test]
    fn test_premium_index_failure_fails_the_venue() {
        let premium = Err(FundingError::NetworkFailure("503".to_string()).into());
        let info = decode("fundingInfo", INFO);
        assert!(combine_responses(premium, info, now()).is_err());
    }

    #[test]
    fn test_missing_next_funding_uses_slot_schedule() {
        let rows = vec![PremiumIndex {
            symbol: "SOLUSDT".to_string(),
            mark_price: "150".to_string(),
            last_funding_rate: "0.0002".to_string(),
            next_funding_time: 0,
        }];
        let snapshots = build_snapshots(rows, &HashMap::new(), now());
        assert_eq!(
            snapshots[0].next_funding_time,
            Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap()
        );
    }
}
