//! Scripted in-memory venue for integration testing.
//!
//! Provides deterministic `RouteProvider`, `SwapExecutor`, `ProfitLedger`
//! and `Delay` implementations. Each keeps its state behind `Arc<Mutex<_>>`
//! so a test can hand one clone to the controller and inspect another.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use roundtrip::engine::clock::Delay;
use roundtrip::engine::shutdown::ShutdownHandle;
use roundtrip::execution::SwapExecutor;
use roundtrip::routing::{RouteProvider, RouteRequest};
use roundtrip::storage::ProfitLedger;
use roundtrip::types::*;

pub const USDC: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
pub const USDT: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";

pub fn usdc() -> Token {
    Token {
        address: USDC.to_string(),
        symbol: "USDC".to_string(),
        decimals: 6,
        name: Some("USD Coin".to_string()),
    }
}

pub fn usdt() -> Token {
    Token {
        address: USDT.to_string(),
        symbol: "USDT".to_string(),
        decimals: 6,
        name: Some("USDT".to_string()),
    }
}

/// Single-hop route with zero fees.
pub fn route(input_mint: &str, output_mint: &str, in_amount: u64, out_amount: u64) -> Route {
    Route {
        in_amount,
        out_amount,
        price_impact_pct: Decimal::ZERO,
        hops: vec![RouteHop {
            label: "Whirlpool".to_string(),
            input_mint: input_mint.to_string(),
            output_mint: output_mint.to_string(),
            fee_pct: Decimal::ZERO,
        }],
        payload: serde_json::json!({ "inAmount": in_amount, "outAmount": out_amount }),
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Route responses scripted per input mint. When a mint's script runs dry
/// the last response is repeated; a mint with no script gets an error.
#[derive(Clone, Default)]
pub struct ScriptedRoutes {
    scripts: Arc<Mutex<HashMap<String, VecDeque<Result<Vec<Route>, String>>>>>,
    last: Arc<Mutex<HashMap<String, Result<Vec<Route>, String>>>>,
    requests: Arc<Mutex<Vec<RouteRequest>>>,
}

impl ScriptedRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a single-route answer for requests from `input_mint`.
    pub fn push(&self, input_mint: &str, output_mint: &str, out_amount: u64) -> &Self {
        let r = route(input_mint, output_mint, 0, out_amount);
        self.push_result(input_mint, Ok(vec![r]))
    }

    pub fn push_error(&self, input_mint: &str, msg: &str) -> &Self {
        self.push_result(input_mint, Err(msg.to_string()))
    }

    fn push_result(&self, input_mint: &str, result: Result<Vec<Route>, String>) -> &Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(input_mint.to_string())
            .or_default()
            .push_back(result);
        self
    }

    pub fn requests(&self) -> Vec<RouteRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_from(&self, input_mint: &str) -> Vec<RouteRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.input_mint == input_mint)
            .collect()
    }
}

#[async_trait]
impl RouteProvider for ScriptedRoutes {
    async fn compute_routes(&self, request: &RouteRequest) -> Result<Vec<Route>> {
        self.requests.lock().unwrap().push(request.clone());

        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&request.input_mint)
            .and_then(|q| q.pop_front());

        let mut last = self.last.lock().unwrap();
        let result = match next {
            Some(r) => {
                last.insert(request.input_mint.clone(), r.clone());
                r
            }
            None => last
                .get(&request.input_mint)
                .cloned()
                .unwrap_or_else(|| Err(format!("no script for {}", request.input_mint))),
        };

        result
            .map(|routes| {
                routes
                    .into_iter()
                    .map(|mut r| {
                        r.in_amount = request.amount;
                        r
                    })
                    .collect()
            })
            .map_err(|e| anyhow!(e))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Executor answering from a queue of outcomes; fills at the route's
/// amounts once the queue is empty.
#[derive(Clone, Default)]
pub struct ScriptedExecutor {
    outcomes: Arc<Mutex<VecDeque<SwapOutcome>>>,
    executed: Arc<Mutex<Vec<Route>>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, outcome: SwapOutcome) -> &Self {
        self.outcomes.lock().unwrap().push_back(outcome);
        self
    }

    pub fn fail_times(&self, n: usize) -> &Self {
        for i in 0..n {
            self.push(SwapOutcome::failed(format!("simulated failure {}", i + 1)));
        }
        self
    }

    pub fn executed(&self) -> Vec<Route> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl SwapExecutor for ScriptedExecutor {
    async fn execute(&self, route: &Route) -> SwapOutcome {
        let n = {
            let mut executed = self.executed.lock().unwrap();
            executed.push(route.clone());
            executed.len()
        };

        self.outcomes.lock().unwrap().pop_front().unwrap_or_else(|| {
            SwapOutcome::Filled(SwapFill {
                tx_id: format!("scripted-{n}"),
                input_amount: Some(route.in_amount),
                output_amount: Some(route.out_amount),
            })
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// A fill reporting `output` atomic units received.
pub fn fill(tx_id: &str, output: u64) -> SwapOutcome {
    SwapOutcome::Filled(SwapFill {
        tx_id: tx_id.to_string(),
        input_amount: None,
        output_amount: Some(output),
    })
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MemoryLedger {
    entries: Arc<Mutex<Vec<ProfitRecord>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<ProfitRecord> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProfitLedger for MemoryLedger {
    async fn record(&self, entry: &ProfitRecord) -> Result<()> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Delay
// ---------------------------------------------------------------------------

/// Records every requested wait without sleeping. Optionally trips the
/// shutdown signal on the n-th wait so `run` loops terminate.
#[derive(Clone, Default)]
pub struct RecordingDelay {
    waits: Arc<Mutex<Vec<Duration>>>,
    stop: Arc<Mutex<Option<(usize, ShutdownHandle)>>>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop_after(self, waits: usize, handle: ShutdownHandle) -> Self {
        *self.stop.lock().unwrap() = Some((waits, handle));
        self
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Delay for RecordingDelay {
    async fn sleep(&self, duration: Duration) {
        let count = {
            let mut waits = self.waits.lock().unwrap();
            waits.push(duration);
            waits.len()
        };

        if let Some((limit, handle)) = self.stop.lock().unwrap().as_ref() {
            if count >= *limit {
                handle.trigger();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use roundtrip::engine::shutdown::Shutdown;

    fn request(input_mint: &str, amount: u64) -> RouteRequest {
        RouteRequest {
            input_mint: input_mint.to_string(),
            output_mint: "X".to_string(),
            amount,
            slippage_bps: 50,
            force_fetch: true,
        }
    }

    #[tokio::test]
    async fn test_scripted_routes_repeat_last() {
        let routes = ScriptedRoutes::new();
        routes.push(USDC, USDT, 10).push(USDC, USDT, 20);

        let a = routes.compute_routes(&request(USDC, 1)).await.unwrap();
        let b = routes.compute_routes(&request(USDC, 2)).await.unwrap();
        let c = routes.compute_routes(&request(USDC, 3)).await.unwrap();

        assert_eq!(a[0].out_amount, 10);
        assert_eq!(b[0].out_amount, 20);
        assert_eq!(c[0].out_amount, 20);
        assert_eq!(c[0].in_amount, 3);
        assert_eq!(routes.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_scripted_routes_unscripted_mint_errors() {
        let routes = ScriptedRoutes::new();
        assert!(routes.compute_routes(&request(USDT, 1)).await.is_err());
    }

    #[tokio::test]
    async fn test_scripted_executor_default_fill() {
        let executor = ScriptedExecutor::new();
        executor.fail_times(1);
        let r = route(USDC, USDT, 5, 7);

        assert!(!executor.execute(&r).await.is_filled());
        assert_eq!(
            executor.execute(&r).await,
            SwapOutcome::Filled(SwapFill {
                tx_id: "scripted-2".to_string(),
                input_amount: Some(5),
                output_amount: Some(7),
            })
        );
    }

    #[tokio::test]
    async fn test_recording_delay_trips_shutdown() {
        let (handle, shutdown) = Shutdown::channel();
        let delay = RecordingDelay::new().stop_after(2, handle);

        delay.sleep(Duration::from_secs(1)).await;
        assert!(!shutdown.is_triggered());
        delay.sleep(Duration::ZERO).await;
        assert!(shutdown.is_triggered());
        assert_eq!(delay.waits(), vec![Duration::from_secs(1), Duration::ZERO]);
    }
}
