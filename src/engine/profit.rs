//! Round-trip profit evaluation.

use rust_decimal::Decimal;

use crate::types::ProfitEstimate;

/// Gross and net profit of turning `input` into `output` of the same token,
/// paying a fixed `fee`. All amounts in human units.
pub fn evaluate(input: Decimal, output: Decimal, fee: Decimal) -> ProfitEstimate {
    let gross = output - input;
    ProfitEstimate {
        gross,
        net: gross - fee,
    }
}
