// In crates/web-server/src/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use core_types::PortError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Execution(#[from] execution::Error),

    #[error("Order book unavailable: {0}")]
    BookUnavailable(#[from] PortError),

    #[error("Malformed request body: {0}")]
    BadRequest(String),

    #[error("Failed to bind server address: {0}")]
    ServerBindError(std::io::Error),

    #[error("Server error: {0}")]
    ServeError(std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        use execution::Error as E;
        match self {
            Error::Execution(err) => {
                let status = match err {
                    E::MissingParameters(_) | E::InvalidSize(_) | E::UnsupportedOrderType(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    E::MarketInactive { .. } => StatusCode::CONFLICT,
                    E::InsufficientHoldings { .. }
                    | E::InsufficientLiquidity { .. }
                    | E::InsufficientBalance { .. }
                    | E::PartialFillRejected { .. }
                    | E::PriceMovedUnfavorably { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    E::ExternalFetchError(_) => StatusCode::BAD_GATEWAY,
                    E::SettlementError(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.code())
            }
            Error::BookUnavailable(_) => (StatusCode::BAD_GATEWAY, "EXTERNAL_FETCH_ERROR"),
            Error::BadRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            Error::ServerBindError(_) | Error::ServeError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL")
            }
        }
    }
}

/// Converts our error into a `{ "code", "message" }` JSON response.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "Request failed");
        }
        (status, Json(json!({ "code": code, "message": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_errors_map_to_documented_statuses() {
        let cases = [
            (execution::Error::MissingParameters(vec!["userId"]), StatusCode::BAD_REQUEST),
            (
                execution::Error::MarketInactive {
                    market_id: core_types::MarketId("m1".into()),
                },
                StatusCode::CONFLICT,
            ),
            (
                execution::Error::ExternalFetchError("timeout".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                execution::Error::SettlementError("rolled back".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(Error::from(err).status_and_code().0, expected);
        }
    }
}
