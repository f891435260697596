//! Signing relay executor.
//!
//! Key custody lives outside this process. The relay receives the raw
//! route plus the wallet's public key, builds and signs the swap
//! transaction, submits it through the configured RPC node and reports
//! back `{ txid, inputAmount, outputAmount, error }`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::{explorer_url, SwapExecutor};
use crate::types::{Route, SwapFill, SwapOutcome};
use crate::units::deserialize_atomic_lenient;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteRequest<'a> {
    route: &'a serde_json::Value,
    user_public_key: &'a str,
    rpc_url: &'a str,
    wrap_unwrap_sol: bool,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ExecuteResponse {
    #[serde(default)]
    txid: Option<String>,
    #[serde(default, deserialize_with = "deserialize_atomic_lenient")]
    input_amount: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_atomic_lenient")]
    output_amount: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

impl ExecuteResponse {
    /// Decode a body the relay answered with a success status. The swap
    /// may already be on chain, so an unreadable body is reported loudly.
    fn decode(body: &str) -> SwapOutcome {
        match serde_json::from_str::<ExecuteResponse>(body) {
            Ok(resp) => resp.into_outcome(),
            Err(e) => {
                error!(
                    error = %e,
                    body,
                    "Relay accepted the swap but its response is unreadable; fill state unknown"
                );
                SwapOutcome::failed(format!("unreadable relay response: {e}"))
            }
        }
    }

    fn into_outcome(self) -> SwapOutcome {
        if let Some(error) = self.error {
            return SwapOutcome::Failed { reason: error };
        }
        match self.txid {
            Some(tx_id) => SwapOutcome::Filled(SwapFill {
                tx_id,
                input_amount: self.input_amount,
                output_amount: self.output_amount,
            }),
            None => SwapOutcome::failed("relay returned neither txid nor error"),
        }
    }
}

pub struct RelayExecutor {
    http: Client,
    relay_url: String,
    user_public_key: String,
    rpc_url: String,
    api_key: Option<SecretString>,
}

impl RelayExecutor {
    pub fn new(
        http: Client,
        relay_url: &str,
        user_public_key: impl Into<String>,
        rpc_url: impl Into<String>,
        api_key: Option<SecretString>,
    ) -> Self {
        Self {
            http,
            relay_url: relay_url.trim_end_matches('/').to_string(),
            user_public_key: user_public_key.into(),
            rpc_url: rpc_url.into(),
            api_key,
        }
    }

    /// Post the route and return the raw body of a successful answer.
    async fn submit(&self, route: &Route) -> Result<String> {
        let request = ExecuteRequest {
            route: &route.payload,
            user_public_key: &self.user_public_key,
            rpc_url: &self.rpc_url,
            wrap_unwrap_sol: true,
        };

        let mut req = self
            .http
            .post(format!("{}/execute", self.relay_url))
            .json(&request);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key.expose_secret());
        }

        let resp = req.send().await.context("Relay request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Relay error {status}: {body}");
        }

        resp.text().await.context("Failed to read relay response")
    }
}

#[async_trait]
impl SwapExecutor for RelayExecutor {
    async fn execute(&self, route: &Route) -> SwapOutcome {
        let outcome = match self.submit(route).await {
            Ok(body) => ExecuteResponse::decode(&body),
            Err(e) => SwapOutcome::failed(format!("{e:#}")),
        };

        match &outcome {
            SwapOutcome::Filled(fill) => info!(
                tx = %explorer_url(&fill.tx_id),
                input_amount = ?fill.input_amount,
                output_amount = ?fill.output_amount,
                "Swap confirmed"
            ),
            SwapOutcome::Failed { reason } => warn!(reason = %reason, "Swap failed"),
        }

        outcome
    }

    fn name(&self) -> &str {
        "relay"
    }
}
