//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (relay API key) are referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::time::Duration;

use crate::types::RoundTripError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub execution: ExecutionConfig,
    pub pair: PairConfig,
    pub trade: TradeConfig,
    pub backoff: BackoffConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    pub rpc_url: String,
    #[serde(default)]
    pub cluster: Cluster,
    #[serde(default = "default_quote_api_url")]
    pub quote_api_url: String,
    /// Overrides the cluster's default token list.
    #[serde(default)]
    pub token_list_url: Option<String>,
}

fn default_quote_api_url() -> String {
    "https://quote-api.jup.ag/v4".to_string()
}

/// Solana cluster the loop trades on.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cluster {
    #[default]
    #[serde(rename = "mainnet-beta")]
    MainnetBeta,
    #[serde(rename = "devnet")]
    Devnet,
    #[serde(rename = "testnet")]
    Testnet,
}

impl Cluster {
    /// Default token list published by the aggregator for this cluster.
    pub fn token_list_url(&self) -> &'static str {
        match self {
            Cluster::MainnetBeta => "https://token.jup.ag/strict",
            Cluster::Devnet => "https://api.jup.ag/api/tokens/devnet",
            Cluster::Testnet => "https://api.jup.ag/api/tokens/testnet",
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cluster::MainnetBeta => write!(f, "mainnet-beta"),
            Cluster::Devnet => write!(f, "devnet"),
            Cluster::Testnet => write!(f, "testnet"),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Log and fill at quoted amounts without touching the chain.
    #[default]
    DryRun,
    /// Hand routes to the external signing relay.
    Relay,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub mode: ExecutionMode,
    #[serde(default)]
    pub relay_url: Option<String>,
    /// Public key of the trading wallet. The relay holds the signer.
    pub user_public_key: String,
    /// Name of the env var holding the relay API key, if the relay needs one.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PairConfig {
    /// Base token: the loop starts and ends holding it.
    pub input_mint: String,
    /// Intermediate token.
    pub output_mint: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TradeConfig {
    /// Fixed probe amount, in base-token human units.
    pub amount: Decimal,
    pub slippage_bps: u16,
    /// Per-hop platform fee ceiling (percentage fraction).
    pub max_fee_pct: Decimal,
    #[serde(default)]
    pub max_price_impact_pct: Option<Decimal>,
    /// Fixed per-round-trip transaction fee, in base-token human units.
    pub tx_fee: Decimal,
    pub min_profit: Decimal,
    /// Net profit bar used while retrying leg 2.
    pub min_profit_leg2_retry: Decimal,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackoffConfig {
    pub leg1_base_delay_ms: u64,
    pub leg2_base_delay_ms: u64,
    /// Leg-2 attempt index wraps to zero after this many attempts.
    pub leg2_reset_count: u32,
    #[serde(default = "default_quote_spacing_ms")]
    pub quote_spacing_ms: u64,
}

fn default_quote_spacing_ms() -> u64 {
    50
}

impl BackoffConfig {
    pub fn leg1_base_delay(&self) -> Duration {
        Duration::from_millis(self.leg1_base_delay_ms)
    }

    pub fn leg2_base_delay(&self) -> Duration {
        Duration::from_millis(self.leg2_base_delay_ms)
    }

    pub fn quote_spacing(&self) -> Duration {
        Duration::from_millis(self.quote_spacing_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    pub path: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: "roundtrip_profits.log".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config = Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the loop cannot run with.
    pub fn validate(&self) -> Result<(), RoundTripError> {
        let fail = |msg: &str| Err(RoundTripError::Config(msg.to_string()));

        if self.trade.amount <= Decimal::ZERO {
            return fail("trade.amount must be positive");
        }
        if self.pair.input_mint == self.pair.output_mint {
            return fail("pair.input_mint and pair.output_mint must differ");
        }
        if self.trade.max_fee_pct < Decimal::ZERO {
            return fail("trade.max_fee_pct must not be negative");
        }
        if self.trade.max_price_impact_pct.is_some_and(|p| p < Decimal::ZERO) {
            return fail("trade.max_price_impact_pct must not be negative");
        }
        if self.trade.tx_fee < Decimal::ZERO {
            return fail("trade.tx_fee must not be negative");
        }
        if self.backoff.leg2_reset_count == 0 {
            return fail("backoff.leg2_reset_count must be at least 1");
        }
        if self.execution.mode == ExecutionMode::Relay && self.execution.relay_url.is_none() {
            return fail("execution.relay_url is required in relay mode");
        }
        Ok(())
    }

    /// Token list URL: explicit override, else the cluster default.
    pub fn token_list_url(&self) -> &str {
        self.network
            .token_list_url
            .as_deref()
            .unwrap_or_else(|| self.network.cluster.token_list_url())
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
