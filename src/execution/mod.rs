//! Execution capability.
//!
//! Defines the `SwapExecutor` trait and provides implementations for:
//! - dry run: fills at the quoted amounts, never touches the chain
//! - signing relay: hands the route to an external service that builds,
//!   signs and submits the transaction

pub mod dry_run;
pub mod relay;

use async_trait::async_trait;

use crate::types::{Route, SwapOutcome};

/// Abstraction over swap execution.
///
/// Implementors never return an error: every failure, transport or
/// on-chain, is reported as `SwapOutcome::Failed`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SwapExecutor: Send + Sync {
    /// Execute a route once.
    async fn execute(&self, route: &Route) -> SwapOutcome;

    /// Executor name for logging.
    fn name(&self) -> &str;
}

/// Explorer link for a transaction id.
pub fn explorer_url(tx_id: &str) -> String {
    format!("https://solscan.io/tx/{tx_id}")
}
