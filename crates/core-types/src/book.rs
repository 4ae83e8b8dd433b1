// In crates/core-types/src/book.rs

//! Point-in-time order book snapshots.
//!
//! A snapshot is built once from a raw venue payload and never mutated. When
//! the market moves, a new snapshot is built.

use crate::decimal::parse_decimal;
use crate::{Error, Result, Side, TokenId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price level as the venue sends it: both fields are strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLevel {
    pub price: String,
    pub size: String,
}

impl RawLevel {
    pub fn new(price: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            price: price.into(),
            size: size.into(),
        }
    }
}

/// The raw book body returned by the venue for one token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBook {
    #[serde(default)]
    pub bids: Vec<RawLevel>,
    #[serde(default)]
    pub asks: Vec<RawLevel>,
}

/// Liquidity available at one price. `size` is always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookLevel {
    pub price: Decimal,
    pub size: Decimal,
}

impl OrderBookLevel {
    pub fn new(price: Decimal, size: Decimal) -> Self {
        Self { price, size }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBookSnapshot {
    pub token_id: TokenId,
    /// Ascending by price, best ask first.
    pub asks: Vec<OrderBookLevel>,
    /// Descending by price, best bid first.
    pub bids: Vec<OrderBookLevel>,
    /// `best_ask - best_bid`, absent if either side is empty.
    pub spread: Option<Decimal>,
    /// `(best_ask + best_bid) / 2`, absent if either side is empty.
    pub mid: Option<Decimal>,
}

impl OrderBookSnapshot {
    /// Normalizes a raw venue payload into a snapshot.
    ///
    /// Every level is parsed into `Decimal`. A level that does not parse fails
    /// the whole snapshot; levels with a non-positive size are discarded.
    pub fn from_raw(token_id: TokenId, raw: &RawBook) -> Result<Self> {
        let bids = normalize_levels(&raw.bids)?;
        let asks = normalize_levels(&raw.asks)?;
        Ok(Self::from_levels(token_id, bids, asks))
    }

    /// Builds a snapshot from already-parsed levels in any order.
    ///
    /// Sorting is stable, so levels sharing a price keep the order the venue
    /// sent them in.
    pub fn from_levels(
        token_id: TokenId,
        mut bids: Vec<OrderBookLevel>,
        mut asks: Vec<OrderBookLevel>,
    ) -> Self {
        bids.retain(|level| level.size > Decimal::ZERO);
        asks.retain(|level| level.size > Decimal::ZERO);

        asks.sort_by(|a, b| a.price.cmp(&b.price));
        bids.sort_by(|a, b| b.price.cmp(&a.price));

        let (spread, mid) = match (asks.first(), bids.first()) {
            (Some(ask), Some(bid)) => (
                Some(ask.price - bid.price),
                Some((ask.price + bid.price) / Decimal::TWO),
            ),
            _ => (None, None),
        };

        Self {
            token_id,
            asks,
            bids,
            spread,
            mid,
        }
    }

    pub fn best_bid(&self) -> Option<&OrderBookLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&OrderBookLevel> {
        self.asks.first()
    }

    /// The levels an order on `side` consumes: asks for a buy, bids for a sell.
    pub fn levels_for(&self, side: Side) -> &[OrderBookLevel] {
        match side {
            Side::Buy => &self.asks,
            Side::Sell => &self.bids,
        }
    }

    /// The best price an order on `side` would trade at first.
    pub fn touch(&self, side: Side) -> Option<Decimal> {
        self.levels_for(side).first().map(|level| level.price)
    }

    /// Total size resting on the side an order on `side` would consume.
    pub fn depth(&self, side: Side) -> Decimal {
        self.levels_for(side).iter().map(|level| level.size).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.asks.is_empty() && self.bids.is_empty()
    }
}

fn normalize_levels(raw: &[RawLevel]) -> Result<Vec<OrderBookLevel>> {
    let mut levels = Vec::with_capacity(raw.len());
    for level in raw {
        let price = parse_decimal("price", &level.price)?;
        let size = parse_decimal("size", &level.size)?;

        if price < Decimal::ZERO {
            return Err(Error::MalformedNumber {
                field: "price",
                value: level.price.clone(),
            });
        }
        if size <= Decimal::ZERO {
            tracing::trace!(price = %price, size = %size, "Dropping empty book level");
            continue;
        }
        levels.push(OrderBookLevel::new(price, size));
    }
    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn token() -> TokenId {
        TokenId("token-yes".into())
    }

    fn raw(bids: &[(&str, &str)], asks: &[(&str, &str)]) -> RawBook {
        RawBook {
            bids: bids.iter().map(|(p, s)| RawLevel::new(*p, *s)).collect(),
            asks: asks.iter().map(|(p, s)| RawLevel::new(*p, *s)).collect(),
        }
    }

    #[test]
    fn sorts_each_side_best_first() {
        let book = raw(
            &[("0.38", "10"), ("0.39", "5"), ("0.35", "40")],
            &[("0.45", "50"), ("0.40", "100"), ("0.47", "1")],
        );
        let snapshot = OrderBookSnapshot::from_raw(token(), &book).unwrap();

        let ask_prices: Vec<_> = snapshot.asks.iter().map(|l| l.price).collect();
        let bid_prices: Vec<_> = snapshot.bids.iter().map(|l| l.price).collect();
        assert_eq!(ask_prices, vec![dec!(0.40), dec!(0.45), dec!(0.47)]);
        assert_eq!(bid_prices, vec![dec!(0.39), dec!(0.38), dec!(0.35)]);
        assert!(snapshot.asks.windows(2).all(|w| w[0].price <= w[1].price));
        assert!(snapshot.bids.windows(2).all(|w| w[0].price >= w[1].price));
    }

    #[test]
    fn spread_and_mid_are_exact() {
        let book = raw(&[("0.39", "5")], &[("0.40", "100")]);
        let snapshot = OrderBookSnapshot::from_raw(token(), &book).unwrap();

        assert_eq!(snapshot.spread, Some(dec!(0.01)));
        assert_eq!(snapshot.mid, Some(dec!(0.395)));
        assert_eq!(snapshot.touch(Side::Buy), Some(dec!(0.40)));
        assert_eq!(snapshot.touch(Side::Sell), Some(dec!(0.39)));
    }

    #[test]
    fn one_sided_book_has_no_spread_or_mid() {
        let book = raw(&[], &[("0.40", "100")]);
        let snapshot = OrderBookSnapshot::from_raw(token(), &book).unwrap();

        assert_eq!(snapshot.spread, None);
        assert_eq!(snapshot.mid, None);
        assert!(snapshot.best_bid().is_none());
        assert_eq!(snapshot.depth(Side::Buy), dec!(100));
        assert_eq!(snapshot.depth(Side::Sell), dec!(0));
    }

    #[test]
    fn drops_zero_and_negative_size_levels() {
        let book = raw(&[("0.30", "0"), ("0.31", "-4")], &[("0.40", "0.000"), ("0.41", "7")]);
        let snapshot = OrderBookSnapshot::from_raw(token(), &book).unwrap();

        assert!(snapshot.bids.is_empty());
        assert_eq!(snapshot.asks, vec![OrderBookLevel::new(dec!(0.41), dec!(7))]);
    }

    #[test]
    fn malformed_level_fails_the_whole_snapshot() {
        let book = raw(&[("0.30", "10")], &[("0.40", "lots")]);
        let err = OrderBookSnapshot::from_raw(token(), &book).unwrap_err();
        assert_eq!(
            err,
            Error::MalformedNumber {
                field: "size",
                value: "lots".into()
            }
        );

        let book = raw(&[("-0.30", "10")], &[]);
        assert!(OrderBookSnapshot::from_raw(token(), &book).is_err());
    }

    #[test]
    fn equal_prices_keep_venue_order() {
        let bids = vec![
            OrderBookLevel::new(dec!(0.30), dec!(1)),
            OrderBookLevel::new(dec!(0.31), dec!(2)),
            OrderBookLevel::new(dec!(0.30), dec!(3)),
        ];
        let snapshot = OrderBookSnapshot::from_levels(token(), bids, vec![]);
        let sizes: Vec<_> = snapshot.bids.iter().map(|l| l.size).collect();
        assert_eq!(sizes, vec![dec!(2), dec!(1), dec!(3)]);
    }

    #[test]
    fn building_twice_yields_equal_snapshots() {
        let book = raw(&[("0.39", "5"), ("0.38", "1")], &[("0.40", "100"), ("0.45", "50")]);
        let first = OrderBookSnapshot::from_raw(token(), &book).unwrap();
        let second = OrderBookSnapshot::from_raw(token(), &book).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn raw_book_deserializes_with_missing_side() {
        let book: RawBook = serde_json::from_str(r#"{"bids":[{"price":"0.5","size":"3"}]}"#).unwrap();
        assert_eq!(book.bids.len(), 1);
        assert!(book.asks.is_empty());
    }
}
