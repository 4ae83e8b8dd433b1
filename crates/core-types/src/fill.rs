// In crates/core-types/src/fill.rs

use crate::decimal::ratio;
use crate::OrderBookLevel;
use rust_decimal::Decimal;
use serde::Serialize;

/// The outcome of walking a requested size through a sequence of book levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillResult {
    pub requested_size: Decimal,
    pub filled_size: Decimal,
    pub remaining_size: Decimal,
    /// Sum of `consumed * level.price` over every level touched.
    pub total_cost: Decimal,
    /// `total_cost / filled_size`; `None` when nothing filled.
    pub avg_price: Option<Decimal>,
    /// Price of the deepest level the fill reached.
    pub worst_price: Option<Decimal>,
    pub levels_consumed: usize,
}

impl FillResult {
    /// True when the whole requested size found liquidity.
    pub fn is_complete(&self) -> bool {
        self.remaining_size.is_zero() && !self.filled_size.is_zero()
    }
}

/// Simulates a market order of `requested_size` against `levels`, best price first.
///
/// At each level the fill consumes `min(remaining, level.size)` and stops once
/// the remaining size reaches zero or the levels run out. This is a pure
/// function: the same levels and size always give the same result.
///
/// A non-positive `requested_size` is a caller error and must be rejected
/// before simulating; here it simply yields an empty fill.
pub fn simulate(levels: &[OrderBookLevel], requested_size: Decimal) -> FillResult {
    let mut remaining = requested_size.max(Decimal::ZERO);
    let mut total_cost = Decimal::ZERO;
    let mut worst_price = None;
    let mut levels_consumed = 0;

    for level in levels {
        if remaining.is_zero() {
            break;
        }
        let consumed = remaining.min(level.size);
        total_cost += consumed * level.price;
        remaining -= consumed;
        worst_price = Some(level.price);
        levels_consumed += 1;
    }

    let filled_size = requested_size.max(Decimal::ZERO) - remaining;

    FillResult {
        requested_size,
        filled_size,
        remaining_size: remaining,
        total_cost,
        avg_price: ratio(total_cost, filled_size),
        worst_price,
        levels_consumed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn asks() -> Vec<OrderBookLevel> {
        vec![
            OrderBookLevel::new(dec!(0.40), dec!(100)),
            OrderBookLevel::new(dec!(0.45), dec!(50)),
        ]
    }

    #[test]
    fn walks_levels_until_filled() {
        let fill = simulate(&asks(), dec!(120));

        assert_eq!(fill.filled_size, dec!(120));
        assert_eq!(fill.remaining_size, dec!(0));
        assert_eq!(fill.total_cost, dec!(49.0));
        assert_eq!(fill.worst_price, Some(dec!(0.45)));
        assert_eq!(fill.levels_consumed, 2);
        assert!(fill.is_complete());

        let avg = fill.avg_price.unwrap();
        assert_eq!(avg.round_dp(4), dec!(0.4083));
        assert_eq!(fill.total_cost / fill.filled_size, avg);
    }

    #[test]
    fn reports_shortfall_when_book_is_exhausted() {
        let fill = simulate(&asks(), dec!(200));

        assert_eq!(fill.filled_size, dec!(150));
        assert_eq!(fill.remaining_size, dec!(50));
        assert_eq!(fill.total_cost, dec!(62.5));
        assert!(!fill.is_complete());
    }

    #[test]
    fn stops_at_first_level_when_it_suffices() {
        let fill = simulate(&asks(), dec!(100));

        assert_eq!(fill.total_cost, dec!(40));
        assert_eq!(fill.avg_price, Some(dec!(0.40)));
        assert_eq!(fill.levels_consumed, 1);
    }

    #[test]
    fn empty_book_fills_nothing() {
        let fill = simulate(&[], dec!(10));

        assert_eq!(fill.filled_size, dec!(0));
        assert_eq!(fill.remaining_size, dec!(10));
        assert_eq!(fill.avg_price, None);
        assert_eq!(fill.worst_price, None);
        assert!(!fill.is_complete());
    }

    #[test]
    fn simulation_is_deterministic() {
        let levels = asks();
        let first = simulate(&levels, dec!(137.25));
        let second = simulate(&levels, dec!(137.25));
        assert_eq!(first, second);
    }

    #[test]
    fn fractional_sizes_keep_exact_cost() {
        let levels = vec![
            OrderBookLevel::new(dec!(0.33), dec!(0.1)),
            OrderBookLevel::new(dec!(0.34), dec!(0.2)),
        ];
        let fill = simulate(&levels, dec!(0.3));
        assert_eq!(fill.total_cost, dec!(0.101));
        assert!(fill.is_complete());
    }
}
