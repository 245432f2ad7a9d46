//! dYdX v4 indexer. USD-settled markets with hourly funding.

use crate::http::{get_json, parse_f64, parse_price};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::types::{Exchange, FundingSnapshot};
use exchange_adapter_trait::{next_slot_boundary, ExchangeAdapter};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;

pub const DEFAULT_BASE_URL: &str = "https://indexer.dydx.trade";

const FUNDING_INTERVAL_HOURS: f64 = 1.0;

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct MarketsResponse {
    markets: BTreeMap<String, Market>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Market {
    ticker: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    oracle_price: Option<String>,
    #[serde(default)]
    next_funding_rate: String,
}

pub struct DydxAdapter {
    client: Client,
    base_url: String,
}

impl DydxAdapter {
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
impl ExchangeAdapter for DydxAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Dydx
    }

    async fn fetch_snapshots(&self) -> Result<Vec<FundingSnapshot>> {
        let url = format!("{}/v4/perpetualMarkets", self.base_url);
        let response = get_json::<MarketsResponse>(&self.client, &url)
            .await
            .context("dYdX perpetual markets")?;
        Ok(build_snapshots(response, Utc::now()))
    }
}

pub(crate) fn build_snapshots(response: MarketsResponse, now: DateTime<Utc>) -> Vec<FundingSnapshot> {
    let next_funding_time = next_slot_boundary(now, FUNDING_INTERVAL_HOURS);
    response
        .markets
        .into_values()
        .filter(|m| m.ticker.ends_with("-USD") && m.status == "ACTIVE")
        .filter_map(|m| {
            let Some(rate) = parse_f64(&m.next_funding_rate) else {
                tracing::debug!(symbol = %m.ticker, "Skipping dYdX market without funding rate");
                return None;
            };
            Some(FundingSnapshot {
                exchange: Exchange::Dydx,
                funding_rate: rate,
                funding_interval_hours: FUNDING_INTERVAL_HOURS,
                next_funding_time,
                mark_price: m.oracle_price.as_deref().and_then(parse_price),
                fetched_at: now,
                symbol: m.ticker,
            })
        })
        .collect()
}
