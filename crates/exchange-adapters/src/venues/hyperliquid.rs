//! Hyperliquid perpetuals. USDC-settled, funding paid every hour on the hour.

use crate::http::{parse_f64, parse_price, post_json};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::types::{Exchange, FundingSnapshot};
use common::FundingError;
use exchange_adapter_trait::{next_slot_boundary, ExchangeAdapter};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

pub const DEFAULT_BASE_URL: &str = "https://api.hyperliquid.xyz";

const FUNDING_INTERVAL_HOURS: f64 = 1.0;

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct Meta {
    universe: Vec<Asset>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Asset {
    name: String,
    #[serde(default)]
    is_delisted: bool,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssetContext {
    #[serde(default)]
    funding: String,
    #[serde(default)]
    mark_px: String,
}

/// `metaAndAssetCtxs` answers with a two-element array: metadata, then contexts
/// in the same order as `universe`.
pub(crate) type MetaAndContexts = (Meta, Vec<AssetContext>);

pub struct HyperliquidAdapter {
    client: Client,
    base_url: String,
}

impl HyperliquidAdapter {
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
impl ExchangeAdapter for HyperliquidAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Hyperliquid
    }

    async fn fetch_snapshots(&self) -> Result<Vec<FundingSnapshot>> {
        let url = format!("{}/info", self.base_url);
        let payload: MetaAndContexts =
            post_json(&self.client, &url, &json!({ "type": "metaAndAssetCtxs" }))
                .await
                .context("Hyperliquid metaAndAssetCtxs")?;
        build_snapshots(payload, Utc::now())
    }
}

pub(crate) fn build_snapshots(
    (meta, contexts): MetaAndContexts,
    now: DateTime<Utc>,
) -> Result<Vec<FundingSnapshot>> {
    if meta.universe.len() != contexts.len() {
        return Err(FundingError::SchemaMismatch(format!(
            "Hyperliquid universe has {} assets but {} contexts",
            meta.universe.len(),
            contexts.len()
        ))
        .into());
    }
    let next_funding_time = next_slot_boundary(now, FUNDING_INTERVAL_HOURS);
    Ok(meta
        .universe
        .into_iter()
        .zip(contexts)
        .filter(|(asset, _)| !asset.is_delisted)
        .filter_map(|(asset, ctx)| {
            let Some(rate) = parse_f64(&ctx.funding) else {
                tracing::debug!(symbol = %asset.name, "Skipping Hyperliquid asset without funding rate");
                return None;
            };
            Some(FundingSnapshot {
                symbol: asset.name,
                exchange: Exchange::Hyperliquid,
                funding_rate: rate,
                funding_interval_hours: FUNDING_INTERVAL_HOURS,
                next_funding_time,
                mark_price: parse_price(&ctx.mark_px),
                fetched_at: now,
            })
        })
        .collect())
}
