// In crates/api-client/src/types.rs

use core_types::{OrderBookSnapshot, RawBook, RawLevel, TokenId};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// The HTTP client for the venue's public order book endpoint.
#[derive(Debug, Clone)]
pub struct ClobClient {
    /// The persistent HTTP client, carrying the request and connect timeouts.
    pub http_client: Client,
    /// The REST base URL, e.g. `https://clob.polymarket.com`.
    pub base_url: String,
}

/// Body of `GET /book?token_id=...`.
#[derive(Debug, Deserialize, Clone)]
pub struct BookResponse {
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    pub bids: Vec<RawLevel>,
    pub asks: Vec<RawLevel>,
}

impl BookResponse {
    pub fn into_raw(self) -> RawBook {
        RawBook {
            bids: self.bids,
            asks: self.asks,
        }
    }
}

/// Subscription request sent once after connecting to the market channel.
#[derive(Debug, Serialize)]
pub struct SubscribeMessage {
    pub assets_ids: Vec<String>,
    #[serde(rename = "type")]
    pub msg_type: String,
}

impl SubscribeMessage {
    pub fn market(token_id: &TokenId) -> Self {
        Self {
            assets_ids: vec![token_id.0.clone()],
            msg_type: "market".into(),
        }
    }
}

/// A frame received on the market channel.
///
/// The venue sends either a JSON array of events or a single event object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WsFrame {
    Batch(Vec<WsBookEvent>),
    Single(WsBookEvent),
    Other(serde_json::Value),
}

/// A full book snapshot event for one asset.
#[derive(Debug, Deserialize, Clone)]
pub struct WsBookEvent {
    /// `"book"` for full snapshots. Absent on some gateways, which only send books.
    #[serde(default)]
    pub event_type: Option<String>,
    pub asset_id: String,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub bids: Vec<RawLevel>,
    #[serde(default)]
    pub asks: Vec<RawLevel>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl WsBookEvent {
    pub fn is_snapshot_for(&self, token_id: &TokenId) -> bool {
        self.asset_id == token_id.0 && self.event_type.as_deref().is_none_or(|t| t == "book")
    }

    pub fn to_snapshot(&self) -> core_types::Result<OrderBookSnapshot> {
        let raw = RawBook {
            bids: self.bids.clone(),
            asks: self.asks.clone(),
        };
        OrderBookSnapshot::from_raw(TokenId(self.asset_id.clone()), &raw)
    }
}

impl WsFrame {
    /// The first full snapshot in this frame for `token_id`, if any.
    pub fn snapshot_for(&self, token_id: &TokenId) -> Option<&WsBookEvent> {
        match self {
            WsFrame::Batch(events) => events.iter().find(|e| e.is_snapshot_for(token_id)),
            WsFrame::Single(event) if event.is_snapshot_for(token_id) => Some(event),
            _ => None,
        }
    }
}
