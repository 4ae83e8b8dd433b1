// In crates/api-client/src/error.rs

use core_types::PortError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to build the API client: {0}")]
    ClientBuildError(String),
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    #[error("API error: status {status}, msg: {msg}")]
    ApiError { status: u16, msg: String },
    #[error("Malformed book: {0}")]
    MalformedBook(#[from] core_types::Error),
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("Live stream closed before a snapshot arrived")]
    StreamClosed,
    #[error("No snapshot within {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for PortError {
    fn from(err: Error) -> Self {
        match err {
            Error::Timeout(after) => PortError::Timeout(after),
            Error::RequestFailed(ref e) if e.is_timeout() => PortError::Fetch(format!("timed out: {e}")),
            other => PortError::Fetch(other.to_string()),
        }
    }
}
