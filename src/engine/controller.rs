//! Execution controller: the round-trip state machine.
//!
//! One outer-loop cycle quotes base → intermediate, then intermediate →
//! base with the leg-1 output, and executes both legs when the round trip
//! clears the profit bar:
//!
//! ```text
//! IDLE → QUOTE_LEG1 → QUOTE_LEG2 → EVALUATE → EXEC_LEG1 → EXEC_LEG2 ─┬→ DONE → IDLE
//!                                                                   └→ LEG2_RETRY* ┘
//! ```
//!
//! A failed leg 1 opened no position, so the cycle is abandoned and the
//! outer loop backs off linearly. A failed leg 2 leaves the intermediate
//! token held; it is re-quoted and retried until it fills, against the
//! relaxed retry threshold and a rotating linear backoff.

use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::backoff::{Leg1Backoff, Leg2Backoff};
use super::clock::Delay;
use super::profit::evaluate;
use super::quote::QuoteService;
use super::shutdown::Shutdown;
use crate::config::AppConfig;
use crate::execution::SwapExecutor;
use crate::storage::ProfitLedger;
use crate::types::{
    CycleOutcome, Leg, ProfitEstimate, ProfitRecord, Quote, QuoteError, RunStats, SwapFill,
    SwapOutcome, Token,
};
use crate::units::from_atomic;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Static trading parameters for the controller.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Probe amount of the base token, human units.
    pub amount: Decimal,
    pub slippage_bps: u16,
    pub tx_fee: Decimal,
    pub min_profit: Decimal,
    pub min_profit_leg2_retry: Decimal,
    pub leg1_base_delay: Duration,
    pub leg2_base_delay: Duration,
    pub leg2_reset_count: u32,
    /// Pause between the leg-1 and leg-2 quote requests.
    pub quote_spacing: Duration,
}

impl From<&AppConfig> for ControllerSettings {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            amount: cfg.trade.amount,
            slippage_bps: cfg.trade.slippage_bps,
            tx_fee: cfg.trade.tx_fee,
            min_profit: cfg.trade.min_profit,
            min_profit_leg2_retry: cfg.trade.min_profit_leg2_retry,
            leg1_base_delay: cfg.backoff.leg1_base_delay(),
            leg2_base_delay: cfg.backoff.leg2_base_delay(),
            leg2_reset_count: cfg.backoff.leg2_reset_count,
            quote_spacing: cfg.backoff.quote_spacing(),
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct ExecutionController {
    quotes: QuoteService,
    executor: Box<dyn SwapExecutor>,
    ledger: Box<dyn ProfitLedger>,
    delay: Box<dyn Delay>,
    shutdown: Shutdown,
    /// Token the loop starts and ends in.
    base: Option<Token>,
    intermediate: Option<Token>,
    settings: ControllerSettings,
}

/// Leg 2 closed after `retries` re-quotes, with the profit of the fill.
struct Closed {
    profit: ProfitEstimate,
    fill: SwapFill,
    retries: u32,
}

impl ExecutionController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        quotes: QuoteService,
        executor: Box<dyn SwapExecutor>,
        ledger: Box<dyn ProfitLedger>,
        delay: Box<dyn Delay>,
        shutdown: Shutdown,
        base: Option<Token>,
        intermediate: Option<Token>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            quotes,
            executor,
            ledger,
            delay,
            shutdown,
            base,
            intermediate,
            settings,
        }
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Run cycles until shutdown, starting from a clean retry state.
    pub async fn run(&self) -> RunStats {
        self.run_from(Leg1Backoff::default()).await
    }

    /// Run cycles until shutdown, starting from `state`.
    pub async fn run_from(&self, mut state: Leg1Backoff) -> RunStats {
        let mut stats = RunStats::default();

        info!(
            amount = %self.settings.amount,
            executor = self.executor.name(),
            "Entering main loop"
        );

        loop {
            let (outcome, next) = self.run_cycle(state).await;
            state = next;
            stats.record(&outcome);
            log_outcome(stats.cycles, &outcome);

            if let CycleOutcome::Cancelled { .. } = outcome {
                break;
            }

            let wait = state.wait(self.settings.leg1_base_delay);
            info!(
                wait_secs = wait.as_secs_f64(),
                "Waiting before next overall attempt"
            );
            if !self.pause(wait).await {
                break;
            }
        }

        info!(
            cycles = stats.cycles,
            round_trips = stats.round_trips,
            leg1_failures = stats.leg1_failures,
            leg2_retries = stats.leg2_retries,
            net_profit = %stats.total_net_profit,
            "Main loop stopped"
        );
        stats
    }

    /// One arbitrage attempt. Takes the leg-1 retry state and hands back the
    /// updated state alongside the outcome.
    pub async fn run_cycle(&self, mut leg1: Leg1Backoff) -> (CycleOutcome, Leg1Backoff) {
        if self.shutdown.is_triggered() {
            return (CycleOutcome::Cancelled { position_open: false }, leg1);
        }

        let first = match self.quote(Leg::First, self.settings.amount).await {
            Ok(q) => q,
            Err(_) => return (CycleOutcome::NoQuote { leg: Leg::First }, leg1),
        };

        if !self.pause(self.settings.quote_spacing).await || self.shutdown.is_triggered() {
            return (CycleOutcome::Cancelled { position_open: false }, leg1);
        }

        let second = match self.quote(Leg::Second, first.output_amount).await {
            Ok(q) => q,
            Err(_) => return (CycleOutcome::NoQuote { leg: Leg::Second }, leg1),
        };

        let profit = evaluate(self.settings.amount, second.output_amount, self.settings.tx_fee);
        info!(
            end_amount = %second.output_amount,
            gross = %profit.gross,
            net = %profit.net,
            "Round trip quoted"
        );

        if !profit.clears(self.settings.min_profit) {
            return (CycleOutcome::Unprofitable { profit }, leg1);
        }

        info!(route = %first.route.labels(), "Executing leg 1");
        let leg1_fill = match self.executor.execute(&first.route).await {
            SwapOutcome::Filled(fill) => {
                leg1.record_success();
                fill
            }
            SwapOutcome::Failed { reason } => {
                leg1.record_failure();
                warn!(reason = %reason, failures = leg1.failures(), "Leg 1 failed, abandoning cycle");
                return (
                    CycleOutcome::Leg1Failed {
                        failures: leg1.failures(),
                    },
                    leg1,
                );
            }
        };

        let received = self.received_amount(&leg1_fill, &first);

        let closed = match self.close_position(second, profit, received).await {
            Some(c) => c,
            None => {
                error!(
                    held = %received,
                    "Shutdown during leg-2 retry; intermediate position left open"
                );
                return (CycleOutcome::Cancelled { position_open: true }, leg1);
            }
        };

        let record = ProfitRecord {
            profit: closed.profit,
            leg1_tx: leg1_fill.tx_id,
            leg2_tx: closed.fill.tx_id,
            timestamp: chrono::Utc::now(),
        };
        if let Err(e) = self.ledger.record(&record).await {
            error!(error = %e, "Failed to append profit ledger");
        }

        (
            CycleOutcome::Completed {
                profit: closed.profit,
                leg2_retries: closed.retries,
            },
            leg1,
        )
    }

    /// Execute leg 2, retrying until it fills. `None` means shutdown.
    ///
    /// Retry k waits `leg2_base_delay * ((k - 1) % leg2_reset_count)` before
    /// re-quoting, so the first retry follows the failure immediately.
    async fn close_position(
        &self,
        quote: Quote,
        profit: ProfitEstimate,
        received: Decimal,
    ) -> Option<Closed> {
        info!(route = %quote.route.labels(), "Executing leg 2");
        let mut outcome = Some(self.executor.execute(&quote.route).await);
        let mut profit = profit;
        let mut backoff = Leg2Backoff::new(self.settings.leg2_reset_count);
        let mut retries = 0u32;

        loop {
            match outcome.take() {
                Some(SwapOutcome::Filled(fill)) => {
                    return Some(Closed {
                        profit,
                        fill,
                        retries,
                    })
                }
                Some(SwapOutcome::Failed { reason }) => {
                    warn!(reason = %reason, "Leg 2 failed, attempting retry")
                }
                None => {}
            }

            let wait = backoff.next_wait(self.settings.leg2_base_delay);
            info!(
                retry = retries + 1,
                wait_secs = wait.as_secs_f64(),
                "Waiting before next leg-2 attempt"
            );
            if !self.pause(wait).await || self.shutdown.is_triggered() {
                return None;
            }
            retries += 1;

            if let Some((retry_profit, retry_outcome)) = self.retry_leg2(received).await {
                profit = retry_profit;
                outcome = Some(retry_outcome);
            }
        }
    }

    /// One leg-2 retry: re-quote `received` back into the base token and
    /// execute if it clears the retry threshold. `None` when nothing was
    /// executed.
    async fn retry_leg2(&self, received: Decimal) -> Option<(ProfitEstimate, SwapOutcome)> {
        let quote = self.quote(Leg::Second, received).await.ok()?;

        let profit = evaluate(self.settings.amount, quote.output_amount, self.settings.tx_fee);
        info!(
            gross = %profit.gross,
            net = %profit.net,
            "Leg 2 re-quoted"
        );

        if !profit.clears(self.settings.min_profit_leg2_retry) {
            debug!(
                threshold = %self.settings.min_profit_leg2_retry,
                "Leg 2 retry below threshold, not executing"
            );
            return None;
        }

        info!(route = %quote.route.labels(), "Executing leg 2");
        let outcome = self.executor.execute(&quote.route).await;
        Some((profit, outcome))
    }

    /// Quote one leg with the configured pair orientation.
    async fn quote(&self, leg: Leg, amount: Decimal) -> Result<Quote, QuoteError> {
        let (from, to) = match leg {
            Leg::First => (self.base.as_ref(), self.intermediate.as_ref()),
            Leg::Second => (self.intermediate.as_ref(), self.base.as_ref()),
        };

        let result = self
            .quotes
            .get_quote(from, to, amount, self.settings.slippage_bps)
            .await;
        if let Err(e) = &result {
            info!(leg = %leg, error = %e, "No usable quote");
        }
        result
    }

    /// Intermediate amount leg 1 actually delivered, falling back to the
    /// quoted output when the executor did not report one.
    fn received_amount(&self, fill: &SwapFill, quote: &Quote) -> Decimal {
        match (fill.output_amount, self.intermediate.as_ref()) {
            (Some(atomic), Some(token)) if atomic > 0 => from_atomic(atomic, token.decimals),
            _ => quote.output_amount,
        }
    }

    /// Sleep unless shutdown is requested first. Returns `false` when the
    /// loop should stop.
    async fn pause(&self, wait: Duration) -> bool {
        if self.shutdown.is_triggered() {
            return false;
        }
        tokio::select! {
            _ = self.delay.sleep(wait) => true,
            _ = self.shutdown.triggered() => false,
        }
    }
}

fn log_outcome(cycle: u64, outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::NoQuote { leg } => debug!(cycle, leg = %leg, "Cycle skipped: no quote"),
        CycleOutcome::Unprofitable { profit } => debug!(
            cycle,
            gross = %profit.gross,
            net = %profit.net,
            "Cycle skipped: below profit threshold"
        ),
        CycleOutcome::Leg1Failed { failures } => {
            warn!(cycle, failures, "Cycle abandoned: leg 1 failed")
        }
        CycleOutcome::Completed {
            profit,
            leg2_retries,
        } => info!(
            cycle,
            gross = %profit.gross,
            net = %profit.net,
            leg2_retries,
            "Round trip complete"
        ),
        CycleOutcome::Cancelled { position_open } => {
            info!(cycle, position_open, "Cycle cancelled")
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
