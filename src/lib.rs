//! ROUNDTRIP: round-trip arbitrage loop over a DEX aggregator.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod units;
pub mod registry;
pub mod routing;
pub mod execution;
pub mod engine;
pub mod storage;
