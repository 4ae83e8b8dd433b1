// In crates/web-server/tests/api.rs

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use core_types::testkit::{snapshot, InMemoryLedger, StaticBookSource};
use core_types::{MarketStatus, PortError};
use events::WsMessage;
use execution::{ExecutionCoordinator, LivePriceGuard};
use risk::PreTradeValidator;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tower::ServiceExt;
use web_server::{AppState, create_router, new_ws_cache};

const ACTIVE: MarketStatus = MarketStatus {
    active: true,
    closed: false,
    archived: false,
};

fn app_with(live: StaticBookSource) -> (axum::Router, Arc<InMemoryLedger>) {
    let ledger = Arc::new(
        InMemoryLedger::new()
            .with_market("m1", ACTIVE)
            .with_balance("alice", dec!(100)),
    );
    let books = Arc::new(StaticBookSource::new(snapshot(
        "yes",
        &[(dec!(0.38), dec!(60))],
        &[(dec!(0.40), dec!(100)), (dec!(0.45), dec!(50))],
    )));
    let validator = PreTradeValidator::new(ledger.clone(), ledger.clone(), Duration::from_secs(1));
    let (ws_tx, _) = broadcast::channel::<WsMessage>(16);

    let coordinator = ExecutionCoordinator::new(Arc::new(validator), books.clone(), ledger.clone())
        .with_live_guard(LivePriceGuard::new(Arc::new(live), dec!(0.005)))
        .with_events(ws_tx.clone());

    let state = AppState {
        coordinator: Arc::new(coordinator),
        books,
        ws_tx,
        ws_cache: new_ws_cache(),
    };
    (create_router(state), ledger)
}

fn app() -> (axum::Router, Arc<InMemoryLedger>) {
    app_with(StaticBookSource::new(snapshot(
        "yes",
        &[(dec!(0.38), dec!(60))],
        &[(dec!(0.40), dec!(100))],
    )))
}

fn post_order(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/orders")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_check_responds_ok() {
    let (app, _) = app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn market_order_settles_and_returns_outcome() {
    let (app, ledger) = app();
    let response = app
        .oneshot(post_order(json!({
            "userId": "alice",
            "marketId": "m1",
            "tokenId": "yes",
            "outcome": "Yes",
            "side": "buy",
            "size": "50",
            "price": "0.40"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["filledSize"], "50");
    assert_eq!(body["orderId"], "order-1");
    assert_eq!(ledger.balance_of("alice"), dec!(80));
}

#[tokio::test]
async fn missing_fields_are_a_bad_request() {
    let (app, ledger) = app();
    let response = app
        .oneshot(post_order(json!({ "userId": "alice", "side": "buy" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "MISSING_PARAMETERS");
    assert!(body["message"].as_str().unwrap().contains("marketId"));
    assert_eq!(ledger.lookups(), 0);
}

#[tokio::test]
async fn stale_price_is_unprocessable() {
    let (app, ledger) = app_with(StaticBookSource::new(snapshot(
        "yes",
        &[],
        &[(dec!(0.42), dec!(100))],
    )));
    let response = app
        .oneshot(post_order(json!({
            "userId": "alice",
            "marketId": "m1",
            "tokenId": "yes",
            "outcome": "Yes",
            "side": "buy",
            "requestedSize": 10,
            "price": 0.50
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["code"], "PRICE_MOVED_UNFAVORABLY");
    assert!(ledger.settlements().is_empty());
}

#[tokio::test]
async fn live_feed_outage_is_a_bad_gateway() {
    let (app, _) = app_with(StaticBookSource::failing(PortError::Timeout(Duration::from_secs(5))));
    let response = app
        .oneshot(post_order(json!({
            "userId": "alice",
            "marketId": "m1",
            "tokenId": "yes",
            "outcome": "Yes",
            "side": "buy",
            "size": "10"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["code"], "EXTERNAL_FETCH_ERROR");
}

#[tokio::test]
async fn unparsable_body_is_an_invalid_request() {
    let (app, _) = app();
    let response = app
        .oneshot(post_order(json!({ "side": "sideways" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn book_endpoint_returns_normalized_snapshot() {
    let (app, _) = app();
    let response = app
        .oneshot(Request::builder().uri("/api/books/yes").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["token_id"], "yes");
    assert_eq!(body["asks"][0]["price"], "0.40");
    assert_eq!(body["spread"], "0.02");
}
