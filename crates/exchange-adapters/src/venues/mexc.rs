//! MEXC USDT perpetual contracts.

use crate::http::{get_json, price_from_f64};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::types::{Exchange, FundingSnapshot, Price};
use common::FundingError;
use exchange_adapter_trait::{
    next_slot_boundary, sanitize_interval_hours, timestamp_millis_to_utc, ExchangeAdapter,
};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

pub const DEFAULT_BASE_URL: &str = "https://contract.mexc.com";

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct Envelope<T> {
    success: bool,
    #[serde(default)]
    code: i64,
    data: Option<Vec<T>>,
}

impl<T> Envelope<T> {
    fn into_data(self, what: &str) -> Result<Vec<T>> {
        if !self.success {
            return Err(
                FundingError::SchemaMismatch(format!("MEXC {} code {}", what, self.code)).into(),
            );
        }
        Ok(self.data.unwrap_or_default())
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FundingRate {
    symbol: String,
    #[serde(default)]
    funding_rate: Option<f64>,
    /// Hours between settlements.
    #[serde(default)]
    collect_cycle: f64,
    #[serde(default)]
    next_settle_time: i64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Ticker {
    symbol: String,
    #[serde(default)]
    fair_price: f64,
}

pub struct MexcAdapter {
    client: Client,
    base_url: String,
}

impl MexcAdapter {
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
impl ExchangeAdapter for MexcAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Mexc
    }

    async fn fetch_snapshots(&self) -> Result<Vec<FundingSnapshot>> {
        let funding_url = format!("{}/api/v1/contract/funding_rate", self.base_url);
        let ticker_url = format!("{}/api/v1/contract/ticker", self.base_url);
        let (funding, tickers) = tokio::join!(
            get_json::<Envelope<FundingRate>>(&self.client, &funding_url),
            get_json::<Envelope<Ticker>>(&self.client, &ticker_url),
        );
        combine_responses(funding, tickers, Utc::now())
    }
}

/// Funding rates are required; tickers only contribute mark prices.
pub(crate) fn combine_responses(
    funding: Result<Envelope<FundingRate>>,
    tickers: Result<Envelope<Ticker>>,
    now: DateTime<Utc>,
) -> Result<Vec<FundingSnapshot>> {
    let funding = funding
        .and_then(|e| e.into_data("funding_rate"))
        .context("MEXC funding rates")?;
    let marks = match tickers.and_then(|e| e.into_data("ticker")) {
        Ok(rows) => mark_table(rows),
        Err(e) => {
            tracing::debug!(error = %e, "MEXC tickers unavailable, snapshots without mark price");
            HashMap::new()
        }
    };
    Ok(build_snapshots(funding, &marks, now))
}

fn mark_table(rows: Vec<Ticker>) -> HashMap<String, Price> {
    rows.into_iter()
        .filter(|row| row.fair_price > 0.0)
        .filter_map(|row| price_from_f64(row.fair_price).map(|p| (row.symbol, p)))
        .collect()
}

pub(crate) fn build_snapshots(
    rows: Vec<FundingRate>,
    marks: &HashMap<String, Price>,
    now: DateTime<Utc>,
) -> Vec<FundingSnapshot> {
    rows.into_iter()
        .filter(|row| row.symbol.ends_with("_USDT"))
        .filter_map(|row| {
            let Some(rate) = row.funding_rate.filter(|r| r.is_finite()) else {
                tracing::debug!(symbol = %row.symbol, "Skipping MEXC contract without funding rate");
                return None;
            };
            let interval = sanitize_interval_hours(row.collect_cycle);
            let next_funding_time = Some(row.next_settle_time)
                .filter(|ms| *ms > 0)
                .and_then(timestamp_millis_to_utc)
                .unwrap_or_else(|| next_slot_boundary(now, interval));
            Some(FundingSnapshot {
                exchange: Exchange::Mexc,
                funding_rate: rate,
                funding_interval_hours: interval,
                next_funding_time,
                mark_price: marks.get(&row.symbol).copied(),
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

    const FUNDING: &str = r#"{"success":true,"code":0,"data":[
        {"symbol":"BTC_USDT","fundingRate":0.0001,"maxFundingRate":0.003,"minFundingRate":-0.003,"collectCycle":8,"nextSettleTime":1710057600000,"timestamp":1710050000000},
        {"symbol":"BTC_USD","fundingRate":0.0002,"maxFundingRate":0.003,"minFundingRate":-0.003,"collectCycle":8,"nextSettleTime":1710057600000,"timestamp":1710050000000},
        {"symbol":"TAO_USDT","fundingRate":-0.00042,"maxFundingRate":0.003,"minFundingRate":-0.003,"collectCycle":4,"nextSettleTime":1710043200000,"timestamp":1710050000000},
        {"symbol":"NEW_USDT","fundingRate":null,"maxFundingRate":0.003,"minFundingRate":-0.003,"collectCycle":8,"nextSettleTime":0,"timestamp":1710050000000}
    ]}"#;

    const TICKERS: &str = r#"{"success":true,"code":0,"data":[
        {"symbol":"BTC_USDT","lastPrice":64000.0,"fairPrice":64002.5,"fundingRate":0.0001}
    ]}"#;

    #[test]
    fn test_build_snapshots() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 3, 0, 0).unwrap();
        let funding = decode::<Envelope<FundingRate>>("funding_rate", FUNDING)
            .unwrap()
            .into_data("funding_rate")
            .unwrap();
        let marks = mark_table(
            decode::<Envelope<Ticker>>("ticker", TICKERS)
                .unwrap()
                .into_data("ticker")
                .unwrap(),
        );
        let snapshots = build_snapshots(funding, &marks, now);

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].symbol, "BTC_USDT");
        assert!(snapshots[0].mark_price.is_some());
        assert_eq!(snapshots[1].symbol, "TAO_USDT");
        assert_eq!(snapshots[1].funding_interval_hours, 4.0);
        assert!(snapshots[1].mark_price.is_none());
    }

    #[test]
    fn test_null_rate_skips_only_that_contract() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 3, 0, 0).unwrap();
        let snapshots = combine_responses(
            decode("funding_rate", FUNDING),
            decode("ticker", TICKERS),
            now,
        )
        .unwrap();
        let symbols: Vec<_> = snapshots.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTC_USDT", "TAO_USDT"]);
    }

    #[test]
    fn test_ticker_failure_keeps_rates_without_marks() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 3, 0, 0).unwrap();
        let tickers = Err(FundingError::NetworkFailure("ticker timed out".to_string()).into());
        let snapshots = combine_responses(decode("funding_rate", FUNDING), tickers, now).unwrap();

        assert_eq!(snapshots.len(), 2);
        assert!(snapshots.iter().all(|s| s.mark_price.is_none()));
        assert_eq!(snapshots[1].funding_interval_hours, 4.0);
    }

    #[test]
    fn test_funding_failure_fails_the_venue() {
        let funding = decode::<Envelope<FundingRate>>(
            "funding_rate",
            r#"{"success":false,"code":510,"message":"too many requests"}"#,
        );
        assert!(combine_responses(funding, decode("ticker", TICKERS), Utc::now()).is_err());
    }

    #[test]
    fn test_unsuccessful_envelope() {
        let body = r#"{"success":false,"code":510,"message":"too many requests"}"#;
        let err = decode::<Envelope<FundingRate>>("funding_rate", body)
            .unwrap()
            .into_data("funding_rate")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FundingError>(),
            Some(FundingError::SchemaMismatch(_))
        ));
    }
}
