//! Conversion between human-readable and atomic token amounts.
//!
//! Also holds the serde helpers for atomic amounts on the wire, which
//! arrive as JSON strings or numbers depending on the service.

use rust_decimal::prelude::*;
use serde::{Deserialize, Deserializer};

/// Largest scale a `Decimal` can carry.
const MAX_DECIMALS: u8 = 28;

fn clamp(decimals: u8) -> u32 {
    u32::from(decimals.min(MAX_DECIMALS))
}

/// Scale a human amount to atomic units, truncating dust below the token's
/// precision. Negative amounts map to zero; amounts beyond `u64` saturate.
pub fn to_atomic(amount: Decimal, decimals: u8) -> u64 {
    if amount <= Decimal::ZERO {
        return 0;
    }
    let factor = Decimal::from_i128_with_scale(10i128.pow(clamp(decimals)), 0);
    amount
        .checked_mul(factor)
        .and_then(|v| v.trunc().to_u64())
        .unwrap_or(u64::MAX)
}

/// Scale an atomic amount back to human units. Exact.
pub fn from_atomic(atomic: u64, decimals: u8) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(atomic), clamp(decimals)).normalize()
}

fn atomic_from_value(value: &serde_json::Value) -> Result<u64, String> {
    match value {
        serde_json::Value::String(s) => s.parse().map_err(|e| format!("invalid amount {s:?}: {e}")),
        serde_json::Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| format!("amount out of range: {n}")),
        other => Err(format!("invalid amount: {other}")),
    }
}

/// Deserialize an atomic amount sent as `"123"` or `123`.
pub fn deserialize_atomic<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    atomic_from_value(&value).map_err(serde::de::Error::custom)
}

/// Like [`deserialize_atomic`], but a null or unreadable amount becomes
/// `None` instead of failing the enclosing document.
pub fn deserialize_atomic_lenient<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u64>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(atomic_from_value(&value).ok())
}
