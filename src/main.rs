//! ROUNDTRIP: round-trip arbitrage loop over a DEX aggregator.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! fetches the token list, wires the quote service, executor and ledger
//! into the controller, and runs the loop until Ctrl+C.

use anyhow::{Context, Result};
use secrecy::SecretString;
use std::time::Duration;
use tracing::{error, info, warn};

use roundtrip::config::{self, ExecutionMode};
use roundtrip::engine::clock::TokioDelay;
use roundtrip::engine::controller::{ControllerSettings, ExecutionController};
use roundtrip::engine::filter::RouteFilter;
use roundtrip::engine::quote::QuoteService;
use roundtrip::engine::shutdown::Shutdown;
use roundtrip::execution::dry_run::DryRunExecutor;
use roundtrip::execution::relay::RelayExecutor;
use roundtrip::execution::SwapExecutor;
use roundtrip::registry::TokenRegistry;
use roundtrip::routing::jupiter::JupiterClient;
use roundtrip::storage::FileLedger;

const USER_AGENT: &str = concat!("roundtrip/", env!("CARGO_PKG_VERSION"));
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path =
        std::env::var("ROUNDTRIP_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let cfg = config::AppConfig::load(&config_path)?;

    init_logging();

    info!(
        cluster = %cfg.network.cluster,
        amount = %cfg.trade.amount,
        mode = ?cfg.execution.mode,
        "ROUNDTRIP starting up"
    );

    // -- Initialise components -------------------------------------------

    let http = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")?;

    let registry = TokenRegistry::fetch(&http, cfg.token_list_url())
        .await
        .context("Unable to load token list")?;

    let base = registry.get(&cfg.pair.input_mint).cloned();
    let intermediate = registry.get(&cfg.pair.output_mint).cloned();
    if base.is_none() {
        warn!(mint = %cfg.pair.input_mint, "Base token not in token list; no quotes will be produced");
    }
    if intermediate.is_none() {
        warn!(mint = %cfg.pair.output_mint, "Intermediate token not in token list; no quotes will be produced");
    }
    if let (Some(b), Some(i)) = (&base, &intermediate) {
        info!(base = %b, intermediate = %i, "Trading pair resolved");
    }

    let filter = RouteFilter::new(cfg.trade.max_fee_pct)
        .with_price_impact_ceiling(cfg.trade.max_price_impact_pct);
    let quotes = QuoteService::new(
        Box::new(JupiterClient::new(http.clone(), cfg.network.quote_api_url.clone())),
        filter,
    );

    let executor: Box<dyn SwapExecutor> = match cfg.execution.mode {
        ExecutionMode::DryRun => {
            warn!("Dry-run mode: swaps are logged, never submitted");
            Box::new(DryRunExecutor::new())
        }
        ExecutionMode::Relay => {
            let relay_url = cfg
                .execution
                .relay_url
                .as_deref()
                .context("execution.relay_url is required in relay mode")?;
            let api_key = match cfg.execution.api_key_env.as_deref() {
                Some(env) => Some(SecretString::new(config::AppConfig::resolve_env(env)?)),
                None => None,
            };
            info!(relay = relay_url, "Using signing relay");
            Box::new(RelayExecutor::new(
                http.clone(),
                relay_url,
                cfg.execution.user_public_key.clone(),
                cfg.network.rpc_url.clone(),
                api_key,
            ))
        }
    };

    let ledger = FileLedger::new(cfg.ledger.path.clone());
    info!(path = ledger.path(), "Profit ledger");

    // -- Shutdown --------------------------------------------------------

    let (handle, shutdown) = Shutdown::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received."),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl+C; stopping"),
        }
        handle.trigger();
    });

    // -- Main loop -------------------------------------------------------

    let controller = ExecutionController::new(
        quotes,
        executor,
        Box::new(ledger),
        Box::new(TokioDelay),
        shutdown,
        base,
        intermediate,
        ControllerSettings::from(&cfg),
    );

    let stats = controller.run().await;

    info!(
        cycles = stats.cycles,
        round_trips = stats.round_trips,
        leg1_failures = stats.leg1_failures,
        leg2_retries = stats.leg2_retries,
        net_profit = %stats.total_net_profit,
        "ROUNDTRIP shut down cleanly."
    );

    Ok(())
}

/// Initialise the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise defaults to `roundtrip=info`.
/// Set `ROUNDTRIP_LOG_JSON=1` for JSON-formatted output.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("roundtrip=info"));

    let json_logging = std::env::var("ROUNDTRIP_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
