//! Jupiter quote API client.
//!
//! `GET {base}/quote` returns every route the aggregator found, ranked
//! best-first, each with per-market fee breakdowns.
//!
//! Amounts arrive as strings or numbers depending on API version; both
//! are accepted.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{RouteProvider, RouteRequest};
use crate::types::{Route, RouteHop};
use crate::units::deserialize_atomic;

const PROVIDER_NAME: &str = "jupiter";

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteInfo {
    #[serde(deserialize_with = "deserialize_atomic")]
    in_amount: u64,
    #[serde(deserialize_with = "deserialize_atomic")]
    out_amount: u64,
    #[serde(default)]
    price_impact_pct: f64,
    #[serde(default)]
    market_infos: Vec<MarketInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarketInfo {
    #[serde(default)]
    label: String,
    #[serde(default)]
    input_mint: String,
    #[serde(default)]
    output_mint: String,
    #[serde(default)]
    platform_fee: Option<Fee>,
}

#[derive(Debug, Deserialize)]
struct Fee {
    #[serde(default)]
    pct: f64,
}

fn pct(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or(Decimal::ZERO)
}

/// Convert one raw route body, keeping it as the route's payload.
fn parse_route(raw: serde_json::Value) -> Result<Route> {
    let info: RouteInfo =
        serde_json::from_value(raw.clone()).context("Malformed route in quote response")?;

    let hops = info
        .market_infos
        .into_iter()
        .map(|m| RouteHop {
            label: m.label,
            input_mint: m.input_mint,
            output_mint: m.output_mint,
            fee_pct: pct(m.platform_fee.map(|f| f.pct).unwrap_or_default()),
        })
        .collect();

    Ok(Route {
        in_amount: info.in_amount,
        out_amount: info.out_amount,
        price_impact_pct: pct(info.price_impact_pct),
        hops,
        payload: raw,
    })
}

/// Convert every well-formed candidate, keeping rank order. Malformed
/// candidates are skipped; the response only fails when none parse.
fn parse_routes(body: QuoteResponse) -> Result<Vec<Route>> {
    let candidates = body.data.len();
    let routes: Vec<Route> = body
        .data
        .into_iter()
        .enumerate()
        .filter_map(|(rank, raw)| match parse_route(raw) {
            Ok(route) => Some(route),
            Err(e) => {
                warn!(rank, error = %e.root_cause(), "Skipping malformed route");
                None
            }
        })
        .collect();

    if candidates > 0 && routes.is_empty() {
        anyhow::bail!("All {candidates} routes in quote response were malformed");
    }
    Ok(routes)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Jupiter quote API client.
pub struct JupiterClient {
    http: Client,
    base_url: String,
}

impl JupiterClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RouteProvider for JupiterClient {
    async fn compute_routes(&self, request: &RouteRequest) -> Result<Vec<Route>> {
        let url = format!("{}/quote", self.base_url);
        let amount = request.amount.to_string();
        let slippage = request.slippage_bps.to_string();

        let mut req = self.http.get(&url).query(&[
            ("inputMint", request.input_mint.as_str()),
            ("outputMint", request.output_mint.as_str()),
            ("amount", amount.as_str()),
            ("slippageBps", slippage.as_str()),
        ]);
        if request.force_fetch {
            req = req.header(CACHE_CONTROL, "no-cache");
        }

        debug!(url = %url, amount = request.amount, "Requesting routes");

        let resp = req.send().await.context("Quote API request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Quote API error {status}: {body}");
        }

        let body: QuoteResponse = resp
            .json()
            .await
            .context("Failed to parse quote response")?;

        parse_routes(body)
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}
