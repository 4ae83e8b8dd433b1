// In crates/core-types/src/decimal.rs

//! Decimal helpers shared by every price, size and cost computation.
//!
//! Values arrive from the venue as strings and stay in `Decimal` from then on.
//! Nothing in this workspace routes a price or a size through `f64`.

use crate::{Error, Result};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses a venue-supplied number such as `"0.45"` or `"1e-2"`.
///
/// `field` names the value in the error so a bad payload can be traced back
/// to the level that carried it.
pub fn parse_decimal(field: &'static str, raw: &str) -> Result<Decimal> {
    let trimmed = raw.trim();
    let parsed = if trimmed.contains(['e', 'E']) {
        Decimal::from_scientific(trimmed)
    } else {
        Decimal::from_str(trimmed)
    };

    parsed.map_err(|_| Error::MalformedNumber {
        field,
        value: raw.to_string(),
    })
}

/// `numerator / denominator`, or `None` when the denominator is zero.
pub fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        return None;
    }
    numerator.checked_div(denominator)
}

/// Relative distance of `value` from `reference`, e.g. `0.50` vs `0.40` is `0.25`.
pub fn relative_deviation(value: Decimal, reference: Decimal) -> Option<Decimal> {
    ratio((value - reference).abs(), reference.abs())
}
