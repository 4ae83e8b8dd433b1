// In crates/execution/src/error.rs

use core_types::{MarketId, OrderType, PortError};
use rust_decimal::Decimal;
use thiserror::Error;

/// Every way a single execution attempt can end without a trade.
///
/// All variants are terminal. None of them leave balances, holdings or order
/// records changed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Missing required parameters: {}", .0.join(", "))]
    MissingParameters(Vec<&'static str>),

    #[error("Requested size must be positive, got {0}")]
    InvalidSize(Decimal),

    #[error("Order type {0:?} is not supported")]
    UnsupportedOrderType(OrderType),

    #[error("Market {market_id} is not tradable")]
    MarketInactive { market_id: MarketId },

    #[error("Insufficient holdings: requested {requested}, held {held}")]
    InsufficientHoldings { requested: Decimal, held: Decimal },

    #[error("Insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity { requested: Decimal, available: Decimal },

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Decimal, available: Decimal },

    #[error("Only {filled} of {requested} could be filled; partial fills are not settled")]
    PartialFillRejected { requested: Decimal, filled: Decimal },

    #[error("Price moved: submitted {submitted}, live {live}, tolerance {tolerance}")]
    PriceMovedUnfavorably {
        submitted: Decimal,
        live: Decimal,
        tolerance: Decimal,
    },

    #[error("External fetch failed: {0}")]
    ExternalFetchError(String),

    #[error("Settlement failed: {0}")]
    SettlementError(String),
}

impl Error {
    /// A stable, machine-readable code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            Error::MissingParameters(_) => "MISSING_PARAMETERS",
            Error::InvalidSize(_) => "INVALID_SIZE",
            Error::UnsupportedOrderType(_) => "UNSUPPORTED_ORDER_TYPE",
            Error::MarketInactive { .. } => "MARKET_INACTIVE",
            Error::InsufficientHoldings { .. } => "INSUFFICIENT_HOLDINGS",
            Error::InsufficientLiquidity { .. } => "INSUFFICIENT_LIQUIDITY",
            Error::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Error::PartialFillRejected { .. } => "PARTIAL_FILL_REJECTED",
            Error::PriceMovedUnfavorably { .. } => "PRICE_MOVED_UNFAVORABLY",
            Error::ExternalFetchError(_) => "EXTERNAL_FETCH_ERROR",
            Error::SettlementError(_) => "SETTLEMENT_ERROR",
        }
    }
}

impl From<PortError> for Error {
    fn from(err: PortError) -> Self {
        match err {
            PortError::Settlement(reason) => Error::SettlementError(reason),
            other => Error::ExternalFetchError(other.to_string()),
        }
    }
}

impl From<risk::Error> for Error {
    fn from(err: risk::Error) -> Self {
        match err {
            risk::Error::MarketInactive { market_id } => Error::MarketInactive { market_id },
            risk::Error::InsufficientHoldings { requested, held } => {
                Error::InsufficientHoldings { requested, held }
            }
            risk::Error::InsufficientLiquidity {
                requested,
                available,
            } => Error::InsufficientLiquidity {
                requested,
                available,
            },
            risk::Error::InsufficientBalance {
                required,
                available,
            } => Error::InsufficientBalance {
                required,
                available,
            },
            risk::Error::Port(port) => port.into(),
        }
    }
}

impl From<core_types::Error> for Error {
    fn from(err: core_types::Error) -> Self {
        match err {
            core_types::Error::MissingParameters(fields) => Error::MissingParameters(fields),
            core_types::Error::InvalidValue { field, .. } => Error::MissingParameters(vec![field]),
            malformed @ core_types::Error::MalformedNumber { .. } => {
                Error::ExternalFetchError(malformed.to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    #[test]
    fn port_errors_split_into_fetch_and_settlement() {
        assert_eq!(
            Error::from(PortError::Timeout(Duration::from_secs(3))).code(),
            "EXTERNAL_FETCH_ERROR"
        );
        assert_eq!(
            Error::from(PortError::NotFound("market m1".into())).code(),
            "EXTERNAL_FETCH_ERROR"
        );
        assert_eq!(
            Error::from(PortError::Settlement("deadlock".into())),
            Error::SettlementError("deadlock".into())
        );
    }

    #[test]
    fn risk_refusals_keep_their_details() {
        let err: Error = risk::Error::InsufficientBalance {
            required: dec!(49.0),
            available: dec!(40.0),
        }
        .into();
        assert_eq!(err.code(), "INSUFFICIENT_BALANCE");
        assert_eq!(
            err.to_string(),
            "Insufficient balance: required 49.0, available 40.0"
        );
    }

    #[test]
    fn missing_parameters_lists_fields() {
        let err: Error = core_types::Error::MissingParameters(vec!["userId", "side"]).into();
        assert_eq!(err.to_string(), "Missing required parameters: userId, side");
    }
}
