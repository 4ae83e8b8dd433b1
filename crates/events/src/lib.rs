// --- WebSocket Message Structures ---

use chrono::{DateTime, Utc};
use core_types::{MarketId, OrderId, OrderRequest, Side, TokenId, UserId};
use rust_decimal::Decimal;
use serde::Serialize;

/// Represents a log message event to be sent to the UI.
#[derive(Debug, Clone, Serialize)]
pub struct WsLogMessage {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
}

/// A trade that settled.
#[derive(Debug, Clone, Serialize)]
pub struct WsOrderExecuted {
    pub timestamp: DateTime<Utc>,
    pub client_order_id: String,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub market_id: MarketId,
    pub token_id: TokenId,
    pub side: Side,
    pub filled_size: Decimal,
    pub avg_price: Decimal,
    pub total_cost: Decimal,
}

/// An execution attempt that was refused or failed. Nothing was settled.
#[derive(Debug, Clone, Serialize)]
pub struct WsOrderRejected {
    pub timestamp: DateTime<Utc>,
    /// Stable machine code, e.g. `"PARTIAL_FILL_REJECTED"`.
    pub code: &'static str,
    pub reason: String,
    /// Absent when the ticket never became a complete request.
    pub request: Option<OrderRequest>,
}

/// The top-level WebSocket message enum.
/// `tag` and `content` are used by serde for clean JSON representation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum WsMessage {
    Log(WsLogMessage),
    OrderExecuted(WsOrderExecuted),
    OrderRejected(WsOrderRejected),
}
