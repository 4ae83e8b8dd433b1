// In crates/risk/src/error.rs

use core_types::{MarketId, PortError};
use rust_decimal::Decimal;
use thiserror::Error;

/// Why a pre-trade check refused an order.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Market {market_id} is not tradable")]
    MarketInactive { market_id: MarketId },

    #[error("Insufficient holdings: requested {requested}, held {held}")]
    InsufficientHoldings { requested: Decimal, held: Decimal },

    #[error("Insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity { requested: Decimal, available: Decimal },

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Decimal, available: Decimal },

    /// A collaborator lookup failed or timed out.
    #[error(transparent)]
    Port(#[from] PortError),
}

pub type Result<T> = std::result::Result<T, Error>;
