//! Bybit linear (USDT) perpetuals, v5 API.

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

pub const DEFAULT_BASE_URL: &str = "https://api.bybit.com";

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Envelope<T> {
    ret_code: i64,
    #[serde(default)]
    ret_msg: String,
    result: Option<ListResult<T>>,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct ListResult<T> {
    #[serde(default = "Vec::new")]
    list: Vec<T>,
}

impl<T> Envelope<T> {
    fn into_list(self, what: &str) -> Result<Vec<T>> {
        if self.ret_code != 0 {
            return Err(FundingError::SchemaMismatch(format!(
                "Bybit {} retCode {}: {}",
                what, self.ret_code, self.ret_msg
            ))
            .into());
        }
        Ok(self.result.map(|r| r.list).unwrap_or_default())
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
    #[serde(default)]
    next_funding_time: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Instrument {
    symbol: String,
    /// Minutes between settlements.
    #[serde(default)]
    funding_interval: f64,
}

pub struct BybitAdapter {
    client: Client,
    base_url: String,
}

impl BybitAdapter {
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
impl ExchangeAdapter for BybitAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Bybit
    }

    async fn fetch_snapshots(&self) -> Result<Vec<FundingSnapshot>> {
        let tickers_url = format!("{}/v5/market/tickers?category=linear", self.base_url);
        let instruments_url = format!(
            "{}/v5/market/instruments-info?category=linear&limit=1000",
            self.base_url
        );
        let (tickers, instruments) = tokio::join!(
            get_json::<Envelope<Ticker>>(&self.client, &tickers_url),
            get_json::<Envelope<Instrument>>(&self.client, &instruments_url),
        );
        combine_responses(tickers, instruments, Utc::now())
    }
}

/// Tickers are required; instrument metadata only refines the intervals.
pub(crate) fn combine_responses(
    tickers: Result<Envelope<Ticker>>,
    instruments: Result<Envelope<Instrument>>,
    now: DateTime<Utc>,
) -> Result<Vec<FundingSnapshot>> {
    let tickers = tickers
        .and_then(|e| e.into_list("tickers"))
        .context("Bybit tickers")?;
    let intervals = match instruments.and_then(|e| e.into_list("instruments")) {
        Ok(rows) => interval_table(rows),
        Err(e) => {
            tracing::debug!(error = %e, "Bybit instruments unavailable, using default intervals");
            HashMap::new()
        }
    };
    Ok(build_snapshots(tickers, &intervals, now))
}

fn interval_table(rows: Vec<Instrument>) -> HashMap<String, f64> {
    rows.into_iter()
        .filter(|row| row.funding_interval > 0.0)
        .map(|row| (row.symbol, row.funding_interval / 60.0))
        .collect()
}

pub(crate) fn build_snapshots(
    rows: Vec<Ticker>,
    intervals: &HashMap<String, f64>,
    now: DateTime<Utc>,
) -> Vec<FundingSnapshot> {
    rows.into_iter()
        .filter(|row| row.symbol.ends_with("USDT"))
        .filter_map(|row| {
            let Some(rate) = parse_f64(&row.funding_rate) else {
                tracing::debug!(symbol = %row.symbol, "Skipping Bybit ticker without funding rate");
                return None;
            };
            let interval = sanitize_interval_hours(
                intervals
                    .get(&row.symbol)
                    .copied()
                    .unwrap_or(DEFAULT_FUNDING_INTERVAL_HOURS),
            );
            let next_funding_time = row
                .next_funding_time
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|ms| *ms > 0)
                .and_then(timestamp_millis_to_utc)
                .unwrap_or_else(|| next_slot_boundary(now, interval));
            Some(FundingSnapshot {
                exchange: Exchange::Bybit,
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
