// In crates/api-client/src/live_connector.rs

use crate::types::{SubscribeMessage, WsFrame};
use crate::{Error, Result};
use app_config::VenueSettings;
use async_trait::async_trait;
use core_types::{BookSource, OrderBookSnapshot, PortResult, TokenId};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout, timeout_at};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const CLOSE_GRACE: Duration = Duration::from_millis(500);

/// A scoped reader of the venue's market channel.
///
/// Every call opens its own connection, waits for the first full book of the
/// requested token and closes the connection again, whatever the outcome.
/// Nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct LiveConnector {
    ws_url: String,
    timeout: Duration,
}

impl LiveConnector {
    /// # Arguments
    /// * `settings` - Provides the market-channel URL.
    /// * `timeout` - Bounds connecting plus waiting for the first snapshot.
    pub fn new(settings: &VenueSettings, timeout: Duration) -> Self {
        Self::with_url(settings.ws_url.clone(), timeout)
    }

    pub fn with_url(ws_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ws_url: ws_url.into(),
            timeout,
        }
    }

    /// Connects, subscribes to `token_id`, and returns the first full snapshot.
    pub async fn fetch_snapshot(&self, token_id: &TokenId) -> Result<OrderBookSnapshot> {
        let deadline = Instant::now() + self.timeout;

        // --- 1. Connect ---
        tracing::debug!(url = %self.ws_url, token_id = %token_id, "Connecting to live market channel");
        let (mut ws, _) = timeout_at(deadline, connect_async(self.ws_url.as_str()))
            .await
            .map_err(|_| Error::Timeout(self.timeout))??;

        // --- 2. Subscribe and wait ---
        let result = match timeout_at(deadline, Self::await_snapshot(&mut ws, token_id)).await {
            Ok(inner) => inner,
            Err(_) => Err(Error::Timeout(self.timeout)),
        };

        // --- 3. Close on every path ---
        if let Ok(Err(e)) = timeout(CLOSE_GRACE, ws.close(None)).await {
            tracing::trace!(error = %e, "Live channel close did not complete cleanly");
        }

        match &result {
            Ok(snapshot) => tracing::debug!(
                token_id = %token_id,
                best_bid = ?snapshot.best_bid().map(|l| l.price),
                best_ask = ?snapshot.best_ask().map(|l| l.price),
                "Live snapshot received"
            ),
            Err(e) => tracing::warn!(token_id = %token_id, error = %e, "Live snapshot unavailable"),
        }
        result
    }

    async fn await_snapshot(ws: &mut WsStream, token_id: &TokenId) -> Result<OrderBookSnapshot> {
        let subscribe = serde_json::to_string(&SubscribeMessage::market(token_id))?;
        ws.send(Message::Text(subscribe.into())).await?;

        while let Some(message) = ws.next().await {
            match message? {
                Message::Text(text) => {
                    let frame = match serde_json::from_str::<WsFrame>(text.as_str()) {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::trace!(error = %e, "Ignoring unparsable frame");
                            continue;
                        }
                    };
                    if let Some(event) = frame.snapshot_for(token_id) {
                        return Ok(event.to_snapshot()?);
                    }
                }
                Message::Ping(payload) => ws.send(Message::Pong(payload)).await?,
                Message::Close(_) => return Err(Error::StreamClosed),
                _ => {}
            }
        }
        Err(Error::StreamClosed)
    }
}

#[async_trait]
impl BookSource for LiveConnector {
    fn name(&self) -> &'static str {
        "clob-ws"
    }

    async fn fetch_book(&self, token_id: &TokenId) -> PortResult<OrderBookSnapshot> {
        self.fetch_snapshot(token_id).await.map_err(Into::into)
    }
}
