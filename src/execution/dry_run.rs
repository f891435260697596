//! Dry-run executor.
//!
//! Logs each route it would execute and reports a fill at the quoted
//! amounts. Used until a signing relay is configured.

use async_trait::async_trait;
use tracing::info;

use super::SwapExecutor;
use crate::types::{Route, SwapFill, SwapOutcome};

#[derive(Debug, Default)]
pub struct DryRunExecutor;

impl DryRunExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SwapExecutor for DryRunExecutor {
    async fn execute(&self, route: &Route) -> SwapOutcome {
        let tx_id = format!("dry-run-{}", uuid::Uuid::new_v4());
        info!(
            tx_id = %tx_id,
            route = %route.labels(),
            in_amount = route.in_amount,
            out_amount = route.out_amount,
            "[DRY RUN] Would execute swap"
        );

        SwapOutcome::Filled(SwapFill {
            tx_id,
            input_amount: Some(route.in_amount),
            output_amount: Some(route.out_amount),
        })
    }

    fn name(&self) -> &str {
        "dry-run"
    }
}
