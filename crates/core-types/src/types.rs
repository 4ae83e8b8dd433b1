// In crates/core-types/src/types.rs

use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the account placing the order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifies a market (one question with its outcome tokens).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketId(pub String);

/// Identifies a single outcome token on the venue's order book.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(pub String);

/// Order identifier assigned by the settlement store at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

macro_rules! impl_display {
    ($($ty:ident),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        })*
    };
}

impl_display!(UserId, MarketId, TokenId, OrderId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Side {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            _ => Err(Error::InvalidValue {
                field: "side",
                value: s.to_string(),
            }),
        }
    }
}

/// Only `Market` orders have an execution path. `Limit` exists so a ticket
/// carrying it can be recognised and rejected rather than misread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    #[default]
    Market,
    Limit,
}

/// A validated request to buy or sell a quantity of an outcome token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub user_id: UserId,
    pub market_id: MarketId,
    pub token_id: TokenId,
    /// Outcome label, e.g. "Yes" or "No".
    pub outcome: String,
    pub side: Side,
    #[serde(default)]
    pub order_type: OrderType,
    pub requested_size: Decimal,
    /// Execution price the caller computed against its own view of the book.
    #[serde(default)]
    pub price: Option<Decimal>,
}

/// The loosely-typed intake form of an order, as received over HTTP or the CLI.
///
/// Every field is optional here so that an absent field is reported as
/// `MissingParameters` instead of an opaque deserialization error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTicket {
    pub user_id: Option<String>,
    pub market_id: Option<String>,
    pub token_id: Option<String>,
    pub outcome: Option<String>,
    pub side: Option<Side>,
    pub order_type: Option<OrderType>,
    #[serde(alias = "size")]
    pub requested_size: Option<Decimal>,
    pub price: Option<Decimal>,
}

impl OrderTicket {
    /// Converts the ticket into an `OrderRequest`, listing every missing field at once.
    pub fn into_request(self) -> Result<OrderRequest> {
        let mut missing = Vec::new();

        let user_id = required(self.user_id, "userId", &mut missing);
        let market_id = required(self.market_id, "marketId", &mut missing);
        let token_id = required(self.token_id, "tokenId", &mut missing);
        let outcome = required(self.outcome, "outcome", &mut missing);
        if self.side.is_none() {
            missing.push("side");
        }
        if self.requested_size.is_none() {
            missing.push("requestedSize");
        }

        match (user_id, market_id, token_id, outcome, self.side, self.requested_size) {
            (Some(user_id), Some(market_id), Some(token_id), Some(outcome), Some(side), Some(requested_size)) => {
                Ok(OrderRequest {
                    user_id: UserId(user_id),
                    market_id: MarketId(market_id),
                    token_id: TokenId(token_id),
                    outcome,
                    side,
                    order_type: self.order_type.unwrap_or_default(),
                    requested_size,
                    price: self.price,
                })
            }
            _ => Err(Error::MissingParameters(missing)),
        }
    }
}

fn required(value: Option<String>, name: &'static str, missing: &mut Vec<&'static str>) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => {
            missing.push(name);
            None
        }
    }
}

/// Tradability flags of a market as held by the metadata store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketStatus {
    pub active: bool,
    pub closed: bool,
    pub archived: bool,
}

impl MarketStatus {
    /// A market is tradable only while active and neither closed nor archived.
    pub fn is_tradable(&self) -> bool {
        self.active && !self.closed && !self.archived
    }
}

/// Everything the atomic settlement call needs to commit one trade.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRequest {
    /// Idempotency key generated once per execution attempt.
    pub client_order_id: String,
    pub user_id: UserId,
    pub market_id: MarketId,
    pub token_id: TokenId,
    pub outcome: String,
    pub side: Side,
    pub size: Decimal,
    pub price: Decimal,
    pub total_cost: Decimal,
}

/// The result handed back to the caller after a successful execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    pub success: bool,
    pub filled_size: Decimal,
    pub avg_price: Decimal,
    pub total_cost: Decimal,
    pub remaining_size: Decimal,
    pub order_id: OrderId,
}
