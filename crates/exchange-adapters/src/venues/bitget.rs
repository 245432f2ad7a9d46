//! Bitget USDT-margined futures, v2 mix API.

use crate::http::{get_json, parse_f64, parse_price};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::types::{Exchange, FundingSnapshot};
use common::FundingError;
use exchange_adapter_trait::{
    next_slot_boundary, sanitize_interval_hours, timestamp_millis_to_utc, ExchangeAdapter,
    DEFAULT_FUNDING_INTERVAL_HOURS,
};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

pub const DEFAULT_BASE_URL: &str = "https://api.bitget.com";

const SUCCESS_CODE: &str = "00000";

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct Envelope<T> {
    code: String,
    #[serde(default)]
    msg: String,
    data: Option<Vec<T>>,
}

impl<T> Envelope<T> {
    fn into_data(self, what: &str) -> Result<Vec<T>> {
        if self.code != SUCCESS_CODE {
            return Err(FundingError::SchemaMismatch(format!(
                "Bitget {} code {}: {}",
                what, self.code, self.msg
            ))
            .into());
        }
        Ok(self.data.unwrap_or_default())
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Ticker {
    symbol: String,
    #[serde(default)]
    mark_price: String,
    #[serde(default)]
    funding_rate: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FundSchedule {
    symbol: String,
    #[serde(default)]
    funding_rate_interval: String,
    #[serde(default)]
    next_update: String,
}

/// Interval and next settlement joined from the funding schedule call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Schedule {
    interval_hours: f64,
    next_funding: Option<DateTime<Utc>>,
}

pub struct BitgetAdapter {
    client: Client,
    base_url: String,
}

impl BitgetAdapter {
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
impl ExchangeAdapter for BitgetAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Bitget
    }

    async fn fetch_snapshots(&self) -> Result<Vec<FundingSnapshot>> {
        let tickers_url = format!(
            "{}/api/v2/mix/market/tickers?productType=USDT-FUTURES",
            self.base_url
        );
        let schedule_url = format!(
            "{}/api/v2/mix/market/current-fund-rate?productType=USDT-FUTURES",
            self.base_url
        );
        let (tickers, schedules) = tokio::join!(
            get_json::<Envelope<Ticker>>(&self.client, &tickers_url),
            get_json::<Envelope<FundSchedule>>(&self.client, &schedule_url),
        );
        combine_responses(tickers, schedules, Utc::now())
    }
}

/// Tickers are required; without the funding schedule, intervals default and
/// settlements follow the slot grid.
pub(crate) fn combine_responses(
    tickers: Result<Envelope<Ticker>>,
    schedules: Result<Envelope<FundSchedule>>,
    now: DateTime<Utc>,
) -> Result<Vec<FundingSnapshot>> {
    let tickers = tickers
        .and_then(|e| e.into_data("tickers"))
        .context("Bitget tickers")?;
    let schedules = match schedules.and_then(|e| e.into_data("current-fund-rate")) {
        Ok(rows) => schedule_table(rows),
        Err(e) => {
            tracing::debug!(error = %e, "Bitget funding schedule unavailable, deriving from slots");
            HashMap::new()
        }
    };
    Ok(build_snapshots(tickers, &schedules, now))
}

fn schedule_table(rows: Vec<FundSchedule>) -> HashMap<String, Schedule> {
    rows.into_iter()
        .map(|row| {
            let schedule = Schedule {
                interval_hours: parse_f64(&row.funding_rate_interval)
                    .unwrap_or(DEFAULT_FUNDING_INTERVAL_HOURS),
                next_funding: row
                    .next_update
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .filter(|ms| *ms > 0)
                    .and_then(timestamp_millis_to_utc),
            };
            (row.symbol, schedule)
        })
        .collect()
}

pub(crate) fn build_snapshots(
    rows: Vec<Ticker>,
    schedules: &HashMap<String, Schedule>,
    now: DateTime<Utc>,
) -> Vec<FundingSnapshot> {
    rows.into_iter()
        .filter(|row| row.symbol.ends_with("USDT"))
        .filter_map(|row| {
            let Some(rate) = parse_f64(&row.funding_rate) else {
                tracing::debug!(symbol = %row.symbol, "Skipping Bitget ticker without funding rate");
                return None;
            };
            let schedule = schedules.get(&row.symbol);
            let interval = sanitize_interval_hours(
                schedule.map_or(DEFAULT_FUNDING_INTERVAL_HOURS, |s| s.interval_hours),
            );
            let next_funding_time = schedule
                .and_then(|s| s.next_funding)
                .unwrap_or_else(|| next_slot_boundary(now, interval));
            Some(FundingSnapshot {
                exchange: Exchange::Bitget,
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

    const TICKERS: &str = r#"{"code":"00000","msg":"success","requestTime":1710050000000,"data":[
        {"symbol":"BTCUSDT","lastPr":"64000","markPrice":"64001.5","fundingRate":"0.000125"},
        {"symbol":"WIFUSDT","lastPr":"2.1","markPrice":"2.1","fundingRate":"0.0004"},
        {"symbol":"NEWUSDT","lastPr":"1","markPrice":"1","fundingRate":""}
    ]}"#;

    const SCHEDULE: &str = r#"{"code":"00000","msg":"success","data":[
        {"symbol":"BTCUSDT","fundingRate":"0.000125","fundingRateInterval":"8","nextUpdate":"1710057600000"}
    ]}"#;

    #[test]
    fn test_build_snapshots_with_and_without_schedule() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 6, 30, 0).unwrap();
        let tickers = decode::<Envelope<Ticker>>("tickers", TICKERS)
            .unwrap()
            .into_data("tickers")
            .unwrap();
        let schedules = schedule_table(
            decode::<Envelope<FundSchedule>>("schedule", SCHEDULE)
                .unwrap()
                .into_data("schedule")
                .unwrap(),
        );
        let snapshots = build_snapshots(tickers, &schedules, now);

        assert_eq!(snapshots.len(), 2);
        assert_eq!(
            snapshots[0].next_funding_time,
            Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap()
        );
        // No schedule row: default interval on the UTC slot grid.
        assert_eq!(snapshots[1].funding_interval_hours, 8.0);
        assert_eq!(
            snapshots[1].next_funding_time,
            Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_schedule_failure_uses_slot_grid() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 9, 15, 0).unwrap();
        let schedules = Err(FundingError::SchemaMismatch("current-fund-rate".to_string()).into());
        let snapshots = combine_responses(decode("tickers", TICKERS), schedules, now).unwrap();

        assert_eq!(snapshots.len(), 2);
        for snapshot in &snapshots {
            assert_eq!(snapshot.funding_interval_hours, 8.0);
            assert_eq!(
                snapshot.next_funding_time,
                Utc.with_ymd_and_hms(2024, 3, 10, 16, 0, 0).unwrap()
            );
        }
    }

    #[test]
    fn test_tickers_failure_fails_the_venue() {
        let tickers = Err(FundingError::NetworkFailure("timeout".to_string()).into());
        let schedules = decode("schedule", SCHEDULE);
        assert!(combine_responses(tickers, schedules, Utc::now()).is_err());
    }

    #[test]
    fn test_missing_data_is_empty() {
        let body = r#"{"code":"00000","msg":"success"}"#;
        let rows = decode::<Envelope<Ticker>>("tickers", body)
            .unwrap()
            .into_data("tickers")
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_error_code_rejected() {
        let body = r#"{"code":"40034","msg":"Parameter does not exist","data":null}"#;
        let err = decode::<Envelope<Ticker>>("tickers", body)
            .unwrap()
            .into_data("tickers")
            .unwrap_err();
        assert!(format!("{}", err).contains("40034"));
    }
}
