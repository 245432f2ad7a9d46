//! Thin JSON-over-HTTP helpers shared by the venue adapters.

use anyhow::{Context, Result};
use common::{FundingError, Price};
use reqwest::{Client, Response};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::str::FromStr;
use std::time::Duration;

/// Per-call timeout used when the caller does not configure one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_ERROR_BODY: usize = 256;

/// Builds the HTTP client shared by all adapters. The timeout bounds every call.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("funding-scanner/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

pub(crate) async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FundingError::NetworkFailure(format!("GET {}: {}", url, e)))?;
    read_json(url, response).await
}

pub(crate) async fn post_json<T, B>(client: &Client, url: &str, body: &B) -> Result<T>
where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
{
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| FundingError::NetworkFailure(format!("POST {}: {}", url, e)))?;
    read_json(url, response).await
}

async fn read_json<T: DeserializeOwned>(url: &str, response: Response) -> Result<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| FundingError::NetworkFailure(format!("{}: reading body: {}", url, e)))?;
    if !status.is_success() {
        let snippet: String = body.chars().take(MAX_ERROR_BODY).collect();
        return Err(FundingError::NetworkFailure(format!("{} returned {}: {}", url, status, snippet)).into());
    }
    decode(url, &body)
}

/// Deserializes a venue payload, reporting failures as a schema mismatch.
pub(crate) fn decode<T: DeserializeOwned>(source: &str, body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| FundingError::SchemaMismatch(format!("{}: {}", source, e)).into())
}

pub(crate) fn parse_f64(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub(crate) fn parse_price(raw: &str) -> Option<Price> {
    Decimal::from_str(raw.trim()).ok().map(Price)
}

pub(crate) fn price_from_f64(value: f64) -> Option<Price> {
    Decimal::from_f64(value).map(Price)
}
