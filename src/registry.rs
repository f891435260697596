//! Token registry.
//!
//! The aggregator publishes its token list as a JSON array of
//! `{ address, symbol, decimals, name }`. It is fetched once at startup
//! and looked up by mint address for the configured pair.

use anyhow::{Context, Result};
use reqwest::Client;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::types::{RoundTripError, Token};

/// In-memory token list keyed by mint address.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    tokens: HashMap<String, Token>,
}

impl TokenRegistry {
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        let tokens = tokens
            .into_iter()
            .map(|t| (t.address.clone(), t))
            .collect();
        Self { tokens }
    }

    /// Fetch the token list from `url`.
    pub async fn fetch(http: &Client, url: &str) -> Result<Self> {
        debug!(url, "Fetching token list");

        let resp = http
            .get(url)
            .send()
            .await
            .context("Token list request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(RoundTripError::Registry(format!("HTTP {status}: {body}")).into());
        }

        let tokens: Vec<Token> = resp
            .json()
            .await
            .context("Failed to parse token list")?;

        if tokens.is_empty() {
            return Err(RoundTripError::Registry("token list is empty".to_string()).into());
        }

        info!(count = tokens.len(), "Token list loaded");
        Ok(Self::from_tokens(tokens))
    }

    pub fn get(&self, address: &str) -> Option<&Token> {
        self.tokens.get(address)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
