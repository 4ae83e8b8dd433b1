// In crates/core-types/src/ports.rs

//! The collaborators the execution engine consumes but does not implement.
//!
//! Each trait is object-safe so the coordinator can hold `Arc<dyn ...>` and
//! tests can substitute in-memory fakes without touching process-wide state.

use crate::{
    MarketId, MarketStatus, OrderBookSnapshot, OrderId, SettlementRequest, TokenId, UserId,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by an external collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortError {
    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store lookup failed: {0}")]
    Store(String),

    #[error("Settlement failed: {0}")]
    Settlement(String),
}

pub type PortResult<T> = std::result::Result<T, PortError>;

/// Anything that can produce a fresh order book snapshot for a token.
///
/// The HTTP venue client and the one-shot live quote stream both implement
/// this, so callers never care which transport supplied the snapshot.
#[async_trait]
pub trait BookSource: Send + Sync {
    /// A short label for logs, e.g. "clob-http" or "clob-ws".
    fn name(&self) -> &'static str;

    async fn fetch_book(&self, token_id: &TokenId) -> PortResult<OrderBookSnapshot>;
}

/// Read access to market metadata.
#[async_trait]
pub trait MarketStore: Send + Sync {
    async fn market_status(&self, market_id: &MarketId) -> PortResult<MarketStatus>;
}

/// Read access to balances and holdings.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn balance(&self, user_id: &UserId) -> PortResult<Decimal>;

    /// Units of `token_id` held by the user in `market_id`; zero when none.
    async fn holdings(
        &self,
        user_id: &UserId,
        market_id: &MarketId,
        token_id: &TokenId,
    ) -> PortResult<Decimal>;
}

/// The single transactional commit of a trade.
///
/// Implementations must debit/credit the balance, adjust holdings and record
/// the order in one transaction, serialized per user. A failure must leave
/// all balances and holdings unchanged. Two executions racing for the same
/// liquidity or balance are only kept apart here.
#[async_trait]
pub trait Settlement: Send + Sync {
    async fn settle(&self, request: &SettlementRequest) -> PortResult<OrderId>;
}
