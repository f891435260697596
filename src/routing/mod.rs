//! Routing capability.
//!
//! Defines the `RouteProvider` trait and an implementation backed by the
//! Jupiter quote API.

pub mod jupiter;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::Route;

/// Parameters of one route computation, in atomic units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    pub input_mint: String,
    pub output_mint: String,
    pub amount: u64,
    pub slippage_bps: u16,
    /// Bypass any cached routes; prices move between polls.
    pub force_fetch: bool,
}

/// Abstraction over the aggregator's route computation.
///
/// Returns candidate routes ranked best-first by the aggregator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn compute_routes(&self, request: &RouteRequest) -> Result<Vec<Route>>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}
