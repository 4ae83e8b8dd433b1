// In crates/api-client/src/lib.rs

use app_config::VenueSettings;
use async_trait::async_trait;
use core_types::{BookSource, OrderBookSnapshot, PortResult, TokenId};

pub mod error;
pub mod live_connector;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use live_connector::LiveConnector;
pub use types::*;

impl ClobClient {
    /// Constructs a new `ClobClient` from the venue settings.
    ///
    /// The request and connect timeouts configured here bound every book fetch.
    pub fn new(settings: &VenueSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .connect_timeout(settings.connect_timeout())
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;

        Ok(ClobClient {
            http_client,
            base_url: settings.rest_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches and normalizes the order book for one token.
    ///
    /// This corresponds to the public `GET /book?token_id=...` endpoint. There
    /// is no caching and no retry: every call reflects the venue at call time.
    pub async fn get_order_book(&self, token_id: &TokenId) -> Result<OrderBookSnapshot> {
        if token_id.0.trim().is_empty() {
            return Err(Error::ApiError {
                status: 400,
                msg: "token id must not be empty".to_string(),
            });
        }

        let url = format!("{}/book", self.base_url);
        tracing::debug!(url = %url, token_id = %token_id, "Fetching order book");

        let response = self
            .http_client
            .get(&url)
            .query(&[("token_id", token_id.0.as_str())])
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        let status = response.status();
        let text = response.text().await.map_err(Error::RequestFailed)?;

        if !status.is_success() {
            return Err(Error::ApiError {
                status: status.as_u16(),
                msg: extract_error_message(&text),
            });
        }

        let body: BookResponse = serde_json::from_str(&text).map_err(Error::DeserializationFailed)?;
        let snapshot = OrderBookSnapshot::from_raw(token_id.clone(), &body.into_raw())?;

        tracing::debug!(
            token_id = %token_id,
            bids = snapshot.bids.len(),
            asks = snapshot.asks.len(),
            spread = ?snapshot.spread,
            "Order book fetched"
        );

        Ok(snapshot)
    }
}

/// The venue returns `{"error": "..."}` on failure; fall back to the raw body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[async_trait]
impl BookSource for ClobClient {
    fn name(&self) -> &'static str {
        "clob-http"
    }

    async fn fetch_book(&self, token_id: &TokenId) -> PortResult<OrderBookSnapshot> {
        self.get_order_book(token_id).await.map_err(Into::into)
    }
}

// Free function to allow api_client::new usage
pub fn new(settings: &VenueSettings) -> Result<ClobClient> {
    ClobClient::new(settings)
}
