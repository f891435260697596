//! Shared types for the ROUNDTRIP loop.
//!
//! These types form the data model used across all modules.
//! Human-unit amounts are `Decimal`; atomic amounts are `u64`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// A token as listed in the aggregator's token registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Chain-specific mint address.
    pub address: String,
    pub symbol: String,
    /// Decimal precision of the token's atomic unit.
    pub decimals: u8,
    #[serde(default)]
    pub name: Option<String>,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol, self.address)
    }
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

/// One hop of a route through a single liquidity venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteHop {
    /// Venue label, e.g. "Orca" or "Raydium".
    pub label: String,
    pub input_mint: String,
    pub output_mint: String,
    /// Fee charged on this hop, as a percentage fraction.
    pub fee_pct: Decimal,
}

/// A candidate swap path produced by the routing capability.
///
/// `payload` is the provider's own route body and is handed back to the
/// execution capability untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub in_amount: u64,
    pub out_amount: u64,
    #[serde(default)]
    pub price_impact_pct: Decimal,
    pub hops: Vec<RouteHop>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Route {
    /// Highest fee charged by any hop (zero for an empty route).
    pub fn max_hop_fee_pct(&self) -> Decimal {
        self.hops
            .iter()
            .map(|h| h.fee_pct)
            .max()
            .unwrap_or(Decimal::ZERO)
    }

    /// Venue labels joined the way the progress log prints them.
    pub fn labels(&self) -> String {
        self.hops
            .iter()
            .map(|h| h.label.as_str())
            .collect::<Vec<_>>()
            .join(" x ")
    }
}

// ---------------------------------------------------------------------------
// Quote
// ---------------------------------------------------------------------------

/// A filtered best route plus its output in human units.
///
/// Always carries a route with a positive output; "no usable route" is
/// reported through [`QuoteError`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub input_amount: Decimal,
    pub output_amount: Decimal,
    pub route: Route,
}

/// Which half of the round trip an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Leg {
    /// Base token → intermediate token.
    First,
    /// Intermediate token → base token.
    Second,
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leg::First => write!(f, "leg 1"),
            Leg::Second => write!(f, "leg 2"),
        }
    }
}

// ---------------------------------------------------------------------------
// Swap outcome
// ---------------------------------------------------------------------------

/// Realised amounts of a successful swap, in atomic units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapFill {
    pub tx_id: String,
    pub input_amount: Option<u64>,
    pub output_amount: Option<u64>,
}

/// Result of handing a route to the execution capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    Filled(SwapFill),
    Failed { reason: String },
}

impl SwapOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        SwapOutcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, SwapOutcome::Filled(_))
    }
}

// ---------------------------------------------------------------------------
// Profit
// ---------------------------------------------------------------------------

/// Gross and net profit of a round trip, in base-token human units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfitEstimate {
    pub gross: Decimal,
    pub net: Decimal,
}

impl ProfitEstimate {
    /// True when the round trip returns more than it started with and the
    /// net profit meets `min_profit`.
    pub fn clears(&self, min_profit: Decimal) -> bool {
        self.gross > Decimal::ZERO && self.net >= min_profit
    }
}

impl fmt::Display for ProfitEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GROSS: {} - NET: {}", self.gross, self.net)
    }
}

/// One completed round trip, as appended to the profit ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitRecord {
    pub profit: ProfitEstimate,
    pub leg1_tx: String,
    pub leg2_tx: String,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Cycle outcome
// ---------------------------------------------------------------------------

/// How one iteration of the outer loop ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// No usable quote for the given leg.
    NoQuote { leg: Leg },
    /// Quotes were fine but the round trip did not clear the threshold.
    Unprofitable { profit: ProfitEstimate },
    /// Leg 1 failed to execute; no position was opened.
    Leg1Failed { failures: u32 },
    /// Both legs executed.
    Completed {
        profit: ProfitEstimate,
        leg2_retries: u32,
    },
    /// Shutdown requested mid-cycle.
    Cancelled { position_open: bool },
}

/// Cumulative counters for a run of the controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub cycles: u64,
    pub round_trips: u64,
    pub leg1_failures: u64,
    pub leg2_retries: u64,
    pub total_net_profit: Decimal,
}

impl RunStats {
    pub fn record(&mut self, outcome: &CycleOutcome) {
        self.cycles += 1;
        match outcome {
            CycleOutcome::Leg1Failed { .. } => self.leg1_failures += 1,
            CycleOutcome::Completed {
                profit,
                leg2_retries,
            } => {
                self.round_trips += 1;
                self.leg2_retries += u64::from(*leg2_retries);
                self.total_net_profit += profit.net;
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Why a quote request produced no usable route.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuoteError {
    #[error("Token not found in registry")]
    MissingToken,

    #[error("Routing capability returned no routes")]
    NoRoutes,

    #[error("All {candidates} candidate routes exceed the fee ceiling")]
    AllRoutesFiltered { candidates: usize },

    #[error("Best route has zero output")]
    ZeroOutput,

    #[error("Routing request failed: {0}")]
    Routing(String),
}

/// Startup-time errors.
#[derive(Debug, thiserror::Error)]
pub enum RoundTripError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Token registry error: {0}")]
    Registry(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
