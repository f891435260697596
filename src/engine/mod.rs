//! Core engine: the quote → evaluate → execute round-trip loop.

pub mod backoff;
pub mod clock;
pub mod controller;
pub mod filter;
pub mod profit;
pub mod quote;
pub mod shutdown;
