//! Persistence layer.
//!
//! Appends one human-readable line per completed round trip to a text
//! file. The file is never rewritten.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::types::ProfitRecord;

/// Durable, append-only record of completed round trips.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfitLedger: Send + Sync {
    async fn record(&self, entry: &ProfitRecord) -> Result<()>;
}

/// Format a ledger line: `GROSS: <g> - NET: <n> at <timestamp>`.
pub fn format_line(entry: &ProfitRecord) -> String {
    format!(
        "{} at {} (leg1 {}, leg2 {})\n",
        entry.profit,
        entry.timestamp.to_rfc3339(),
        entry.leg1_tx,
        entry.leg2_tx,
    )
}

/// Ledger backed by a plain text file.
pub struct FileLedger {
    path: String,
}

impl FileLedger {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl ProfitLedger for FileLedger {
    async fn record(&self, entry: &ProfitRecord) -> Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open ledger {}", self.path))?;

        file.write_all(format_line(entry).as_bytes())
            .await
            .with_context(|| format!("Failed to append to ledger {}", self.path))?;
        file.flush().await?;

        debug!(path = %self.path, net = %entry.profit.net, "Ledger line appended");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
