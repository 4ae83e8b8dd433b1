// In crates/core-types/src/lib.rs

pub mod book;
pub mod decimal;
pub mod error;
pub mod fill;
pub mod ports;
pub mod types;

#[cfg(feature = "testkit")]
pub mod testkit;

// Re-export the most important types for easy access from other crates.
pub use book::{OrderBookLevel, OrderBookSnapshot, RawBook, RawLevel};
pub use error::{Error, Result};
pub use fill::{simulate, FillResult};
pub use ports::{BookSource, LedgerStore, MarketStore, PortError, PortResult, Settlement};
pub use types::{
    ExecutionOutcome, MarketId, MarketStatus, OrderId, OrderRequest, OrderTicket, OrderType,
    SettlementRequest, Side, TokenId, UserId,
};
