// In crates/web-server/src/lib.rs

use app_config::types::ServerSettings;
use axum::{
    Router,
    extract::{
        Path, State,
        rejection::JsonRejection,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Json},
    routing::{get, post},
};
use core_types::{BookSource, ExecutionOutcome, OrderBookSnapshot, OrderTicket, TokenId};
use events::WsMessage;
use execution::ExecutionCoordinator;
use futures::{sink::SinkExt, stream::StreamExt}; // for websocket send/receive
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

pub mod error;

// Re-export our custom error type for convenience.
pub use error::{Error, Result};

/// WebSocket message replay cache.
pub type WsCache = Arc<Mutex<VecDeque<WsMessage>>>;

/// The maximum number of messages to keep in the replay cache.
pub const WS_CACHE_SIZE: usize = 200;

/// The shared application state that is available to all API handlers.
#[derive(Clone)]
pub struct AppState {
    /// Runs submitted orders; built with the live price guard for this surface.
    pub coordinator: Arc<ExecutionCoordinator>,
    /// Serves `GET /api/books/{token_id}`.
    pub books: Arc<dyn BookSource>,
    pub ws_tx: broadcast::Sender<WsMessage>, // For broadcasting live messages
    pub ws_cache: WsCache,                   // For replaying recent messages
}

pub fn new_ws_cache() -> WsCache {
    Arc::new(Mutex::new(VecDeque::with_capacity(WS_CACHE_SIZE)))
}

/// Appends `msg` to the replay cache, evicting the oldest entry when full.
pub fn cache_message(cache: &WsCache, msg: WsMessage) {
    if let Ok(mut cache) = cache.lock() {
        if cache.len() >= WS_CACHE_SIZE {
            cache.pop_front();
        }
        cache.push_back(msg);
    }
}

/// Creates the main application router with all routes and middleware.
///
/// # Arguments
///
/// * `app_state`: The shared `AppState` holding the coordinator and event channel.
///
/// # Returns
///
/// The configured `axum::Router`.
pub fn create_router(app_state: AppState) -> Router {
    // In a production environment, you would restrict the origin to your actual frontend domain.
    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let api_router = Router::new()
        .route("/orders", post(create_order_handler))
        .route("/books/{token_id}", get(get_book_handler));

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_check_handler))
        .nest("/api", api_router)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// A simple health check handler.
async fn health_check_handler() -> &'static str {
    "OK"
}

/// Handler for `POST /api/orders`.
/// Runs the submitted ticket through the full execution pipeline.
async fn create_order_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<OrderTicket>, JsonRejection>,
) -> Result<Json<ExecutionOutcome>> {
    let Json(ticket) = payload.map_err(|rejection| Error::BadRequest(rejection.body_text()))?;
    let outcome = state.coordinator.execute_ticket(ticket).await?;
    Ok(Json(outcome))
}

/// Handler for `GET /api/books/{token_id}`.
async fn get_book_handler(
    State(state): State<AppState>,
    Path(token_id): Path<String>,
) -> Result<Json<OrderBookSnapshot>> {
    let token_id = TokenId(token_id);
    tracing::debug!(token_id = %token_id, source = state.books.name(), "Fetching book");
    let book = state.books.fetch_book(&token_id).await?;
    Ok(Json(book))
}

/// The handler for `GET /ws`.
/// Upgrades the connection to a WebSocket and handles the real-time communication.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn send_json(socket: &mut WebSocket, msg: &WsMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json_msg) => socket.send(Message::Text(json_msg.into())).await.is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Skipping unserializable WebSocket message");
            true
        }
    }
}

/// The actual WebSocket handling logic after the connection is upgraded.
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    tracing::info!("New WebSocket client connected.");

    // Subscribe before the replay so nothing published in between is lost.
    let mut rx = state.ws_tx.subscribe();

    // --- 1. The "Replay" ---
    let replay_msgs: Vec<WsMessage> = state
        .ws_cache
        .lock()
        .map(|cache| cache.iter().cloned().collect())
        .unwrap_or_default();
    for msg in &replay_msgs {
        if !send_json(&mut socket, msg).await {
            tracing::info!("WebSocket client disconnected during replay.");
            return;
        }
    }

    // --- 2. "Going Live" ---
    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(msg) => {
                    if !send_json(&mut socket, &msg).await {
                        tracing::info!("WebSocket client disconnected.");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "WebSocket client lagged behind the event stream.");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.next() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }
    tracing::info!("WebSocket client connection closed.");
}

/// Copies order events from the broadcast channel into the replay cache.
///
/// Log lines are cached by the tracing layer that produces them.
pub fn spawn_event_recorder(
    ws_tx: &broadcast::Sender<WsMessage>,
    cache: WsCache,
) -> tokio::task::JoinHandle<()> {
    let mut rx = ws_tx.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(WsMessage::Log(_)) => {}
                Ok(msg) => cache_message(&cache, msg),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// The main entry point for running the web server.
///
/// This function sets up the TCP listener and serves the application router.
/// It will run forever until the process is terminated.
pub async fn run(settings: &ServerSettings, app_state: AppState) -> Result<()> {
    let recorder = spawn_event_recorder(&app_state.ws_tx, app_state.ws_cache.clone());
    let app = create_router(app_state);

    let address = format!("{}:{}", settings.host, settings.port);
    tracing::info!("Web server listening on {}", address);

    let listener = TcpListener::bind(&address).await.map_err(Error::ServerBindError)?;
    let served = axum::serve(listener, app.into_make_service()).await;
    recorder.abort();

    served.map_err(Error::ServeError)
}
