// In crates/execution/tests/coordinator.rs

use core_types::testkit::{snapshot, InMemoryLedger, StaticBookSource};
use core_types::{
    MarketId, MarketStatus, MarketStore, OrderBookSnapshot, OrderRequest, OrderTicket, OrderType,
    PortError, PortResult, Side, TokenId, UserId,
};
use events::WsMessage;
use execution::{Error, ExecutionCoordinator, Executor, LivePriceGuard};
use risk::PreTradeValidator;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

const ACTIVE: MarketStatus = MarketStatus {
    active: true,
    closed: false,
    archived: false,
};

fn book() -> OrderBookSnapshot {
    snapshot(
        "yes",
        &[(dec!(0.38), dec!(60)), (dec!(0.36), dec!(40))],
        &[(dec!(0.40), dec!(100)), (dec!(0.45), dec!(50))],
    )
}

fn request(side: Side, size: Decimal) -> OrderRequest {
    OrderRequest {
        user_id: UserId("alice".into()),
        market_id: MarketId("m1".into()),
        token_id: TokenId("yes".into()),
        outcome: "Yes".into(),
        side,
        order_type: OrderType::Market,
        requested_size: size,
        price: None,
    }
}

fn funded_ledger() -> Arc<InMemoryLedger> {
    Arc::new(
        InMemoryLedger::new()
            .with_market("m1", ACTIVE)
            .with_balance("alice", dec!(100))
            .with_holdings("alice", "m1", "yes", dec!(80)),
    )
}

fn coordinator(ledger: Arc<InMemoryLedger>, books: Arc<StaticBookSource>) -> ExecutionCoordinator {
    let validator = PreTradeValidator::new(ledger.clone(), ledger.clone(), Duration::from_secs(1));
    ExecutionCoordinator::new(Arc::new(validator), books, ledger)
}

#[tokio::test]
async fn buy_walks_the_asks_and_settles() {
    let ledger = funded_ledger();
    let books = Arc::new(StaticBookSource::new(book()));

    let outcome = coordinator(ledger.clone(), books.clone())
        .execute(&request(Side::Buy, dec!(120)))
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.filled_size, dec!(120));
    assert_eq!(outcome.total_cost, dec!(49.0));
    assert_eq!(outcome.remaining_size, Decimal::ZERO);
    assert_eq!(outcome.avg_price.round_dp(4), dec!(0.4083));
    assert_eq!(outcome.order_id.0, "order-1");

    // Validation and execution each take their own snapshot.
    assert_eq!(books.calls(), 2);

    let settled = ledger.settlements();
    assert_eq!(settled.len(), 1);
    assert_eq!(settled[0].size, dec!(120));
    assert_eq!(settled[0].total_cost, dec!(49.0));
    assert!(!settled[0].client_order_id.is_empty());
    assert_eq!(ledger.balance_of("alice"), dec!(51.0));
    assert_eq!(ledger.holdings_of("alice", "m1", "yes"), dec!(200));
}

#[tokio::test]
async fn sell_walks_the_bids_and_credits_balance() {
    let ledger = funded_ledger();
    let books = Arc::new(StaticBookSource::new(book()));

    let outcome = coordinator(ledger.clone(), books)
        .execute(&request(Side::Sell, dec!(80)))
        .await
        .unwrap();

    // 60 @ 0.38 + 20 @ 0.36
    assert_eq!(outcome.total_cost, dec!(30.0));
    assert_eq!(ledger.balance_of("alice"), dec!(130.0));
    assert_eq!(ledger.holdings_of("alice", "m1", "yes"), Decimal::ZERO);
}

#[tokio::test]
async fn book_too_thin_at_validation_is_insufficient_liquidity() {
    let ledger = Arc::new(
        InMemoryLedger::new()
            .with_market("m1", ACTIVE)
            .with_balance("alice", dec!(1000)),
    );
    let books = Arc::new(StaticBookSource::new(book()));

    let err = coordinator(ledger.clone(), books)
        .execute(&request(Side::Buy, dec!(200)))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        Error::InsufficientLiquidity {
            requested: dec!(200),
            available: dec!(150)
        }
    );
    assert!(ledger.settlements().is_empty());
}

#[tokio::test]
async fn liquidity_vanishing_after_validation_is_a_rejected_partial_fill() {
    let ledger = funded_ledger();
    let thinner = snapshot("yes", &[], &[(dec!(0.40), dec!(80))]);
    let books = Arc::new(StaticBookSource::sequence(vec![Ok(book()), Ok(thinner)]));

    let err = coordinator(ledger.clone(), books)
        .execute(&request(Side::Buy, dec!(100)))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        Error::PartialFillRejected {
            requested: dec!(100),
            filled: dec!(80)
        }
    );
    assert!(ledger.settlements().is_empty());
    assert_eq!(ledger.balance_of("alice"), dec!(100));
}

#[tokio::test]
async fn sell_partially_covered_by_bids_is_rejected_wholesale() {
    let ledger = funded_ledger();
    let books = Arc::new(StaticBookSource::new(snapshot(
        "yes",
        &[(dec!(0.38), dec!(50))],
        &[(dec!(0.40), dec!(100))],
    )));

    let err = coordinator(ledger.clone(), books)
        .execute(&request(Side::Sell, dec!(80)))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "PARTIAL_FILL_REJECTED");
    assert!(ledger.settlements().is_empty());
    assert_eq!(ledger.holdings_of("alice", "m1", "yes"), dec!(80));
}

#[tokio::test]
async fn oversized_sell_fails_on_holdings_without_fetching_a_book() {
    let ledger = funded_ledger();
    let books = Arc::new(StaticBookSource::new(book()));

    let err = coordinator(ledger, books.clone())
        .execute(&request(Side::Sell, dec!(100)))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        Error::InsufficientHoldings {
            requested: dec!(100),
            held: dec!(80)
        }
    );
    assert_eq!(books.calls(), 0);
}

#[tokio::test]
async fn buy_costing_more_than_balance_is_refused() {
    let ledger = Arc::new(
        InMemoryLedger::new()
            .with_market("m1", ACTIVE)
            .with_balance("alice", dec!(40.0)),
    );
    let books = Arc::new(StaticBookSource::new(book()));

    let err = coordinator(ledger.clone(), books)
        .execute(&request(Side::Buy, dec!(120)))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "INSUFFICIENT_BALANCE");
    assert!(ledger.settlements().is_empty());
}

#[tokio::test]
async fn archived_market_is_refused_before_any_book_fetch() {
    let ledger = Arc::new(InMemoryLedger::new().with_market(
        "m1",
        MarketStatus {
            active: true,
            closed: false,
            archived: true,
        },
    ));
    let books = Arc::new(StaticBookSource::new(book()));

    let err = coordinator(ledger, books.clone())
        .execute(&request(Side::Buy, dec!(1)))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MarketInactive { .. }));
    assert_eq!(books.calls(), 0);
}

#[tokio::test]
async fn live_guard_rejects_a_stale_submitted_price() {
    let ledger = funded_ledger();
    let books = Arc::new(StaticBookSource::new(book()));
    let live = Arc::new(StaticBookSource::new(snapshot(
        "yes",
        &[],
        &[(dec!(0.42), dec!(500))],
    )));

    let coordinator = coordinator(ledger.clone(), books)
        .with_live_guard(LivePriceGuard::new(live.clone(), dec!(0.005)));
    let mut order = request(Side::Buy, dec!(10));
    order.price = Some(dec!(0.50));

    let err = coordinator.execute(&order).await.unwrap_err();

    assert_eq!(
        err,
        Error::PriceMovedUnfavorably {
            submitted: dec!(0.50),
            live: dec!(0.42),
            tolerance: dec!(0.005)
        }
    );
    assert_eq!(live.calls(), 1);
    assert!(ledger.settlements().is_empty());
}

#[tokio::test]
async fn live_guard_passes_when_quote_matches() {
    let ledger = funded_ledger();
    let books = Arc::new(StaticBookSource::new(book()));
    let live = Arc::new(StaticBookSource::new(book()));

    let coordinator = coordinator(ledger.clone(), books)
        .with_live_guard(LivePriceGuard::new(live, dec!(0.005)));

    let outcome = coordinator.execute(&request(Side::Buy, dec!(50))).await.unwrap();
    assert_eq!(outcome.avg_price, dec!(0.40));
    assert_eq!(ledger.settlements().len(), 1);
}

#[tokio::test]
async fn unmoved_market_passes_guard_for_multi_level_fills_without_a_price() {
    let ledger = funded_ledger();
    let books = Arc::new(StaticBookSource::new(book()));
    let live = Arc::new(StaticBookSource::new(book()));

    let coordinator = coordinator(ledger.clone(), books)
        .with_live_guard(LivePriceGuard::new(live, dec!(0.005)));

    // Both fills reach past the touch, so their averages sit off the best price.
    let buy = coordinator.execute(&request(Side::Buy, dec!(120))).await.unwrap();
    assert_eq!(buy.avg_price.round_dp(4), dec!(0.4083));

    let sell = coordinator.execute(&request(Side::Sell, dec!(80))).await.unwrap();
    assert_eq!(sell.total_cost, dec!(30.0));

    assert_eq!(ledger.settlements().len(), 2);
}

#[tokio::test]
async fn live_quote_timeout_is_an_external_fetch_error() {
    let ledger = funded_ledger();
    let books = Arc::new(StaticBookSource::new(book()));
    let live = Arc::new(StaticBookSource::failing(PortError::Timeout(Duration::from_secs(5))));

    let err = coordinator(ledger.clone(), books)
        .with_live_guard(LivePriceGuard::new(live, dec!(0.005)))
        .execute(&request(Side::Buy, dec!(10)))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "EXTERNAL_FETCH_ERROR");
    assert!(ledger.settlements().is_empty());
}

#[tokio::test]
async fn failed_settlement_leaves_the_ledger_untouched() {
    let ledger = Arc::new(
        InMemoryLedger::new()
            .with_market("m1", ACTIVE)
            .with_balance("alice", dec!(100))
            .failing_settlement("serialization failure"),
    );
    let books = Arc::new(StaticBookSource::new(book()));

    let err = coordinator(ledger.clone(), books)
        .execute(&request(Side::Buy, dec!(10)))
        .await
        .unwrap_err();

    assert_eq!(err, Error::SettlementError("serialization failure".into()));
    assert_eq!(ledger.balance_of("alice"), dec!(100));
    assert_eq!(ledger.holdings_of("alice", "m1", "yes"), Decimal::ZERO);
}

#[tokio::test]
async fn book_fetch_failure_aborts_with_no_side_effects() {
    let ledger = funded_ledger();
    let books = Arc::new(StaticBookSource::failing(PortError::Fetch("502 Bad Gateway".into())));

    let err = coordinator(ledger.clone(), books)
        .execute(&request(Side::Buy, dec!(10)))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ExternalFetchError(_)));
    assert!(ledger.settlements().is_empty());
}

struct SlowMarkets(Duration);

#[async_trait::async_trait]
impl MarketStore for SlowMarkets {
    async fn market_status(&self, _market_id: &MarketId) -> PortResult<MarketStatus> {
        tokio::time::sleep(self.0).await;
        Ok(ACTIVE)
    }
}

#[tokio::test]
async fn slow_store_lookup_times_out() {
    let ledger = funded_ledger();
    let books = Arc::new(StaticBookSource::new(book()));
    let markets = Arc::new(SlowMarkets(Duration::from_secs(5)));
    let validator = PreTradeValidator::new(markets, ledger.clone(), Duration::from_millis(50));
    let coordinator = ExecutionCoordinator::new(Arc::new(validator), books.clone(), ledger.clone());

    let err = coordinator.execute(&request(Side::Buy, dec!(10))).await.unwrap_err();

    assert_eq!(err.code(), "EXTERNAL_FETCH_ERROR");
    assert_eq!(books.calls(), 0);
    assert!(ledger.settlements().is_empty());
}

#[tokio::test]
async fn malformed_requests_fail_before_io() {
    let ledger = funded_ledger();
    let books = Arc::new(StaticBookSource::new(book()));
    let coordinator = coordinator(ledger.clone(), books.clone());

    let err = coordinator.execute(&request(Side::Buy, dec!(0))).await.unwrap_err();
    assert_eq!(err, Error::InvalidSize(dec!(0)));

    let mut limit = request(Side::Buy, dec!(10));
    limit.order_type = OrderType::Limit;
    let err = coordinator.execute(&limit).await.unwrap_err();
    assert_eq!(err, Error::UnsupportedOrderType(OrderType::Limit));

    let err = coordinator
        .execute_ticket(OrderTicket {
            user_id: Some("alice".into()),
            side: Some(Side::Buy),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        Error::MissingParameters(vec!["marketId", "tokenId", "outcome", "requestedSize"])
    );

    let mut blank = request(Side::Sell, dec!(10));
    blank.token_id = TokenId("  ".into());
    blank.user_id = UserId(String::new());
    let err = coordinator.execute(&blank).await.unwrap_err();
    assert_eq!(err, Error::MissingParameters(vec!["userId", "tokenId"]));

    assert_eq!(books.calls(), 0);
    assert_eq!(ledger.lookups(), 0);
}

#[tokio::test]
async fn every_attempt_publishes_one_event() {
    let ledger = funded_ledger();
    let books = Arc::new(StaticBookSource::new(book()));
    let (tx, mut rx) = broadcast::channel(16);
    let coordinator = coordinator(ledger, books).with_events(tx);

    coordinator.execute(&request(Side::Buy, dec!(10))).await.unwrap();
    coordinator.execute(&request(Side::Sell, dec!(500))).await.unwrap_err();

    match rx.recv().await.unwrap() {
        WsMessage::OrderExecuted(event) => assert_eq!(event.filled_size, dec!(10)),
        other => panic!("unexpected event: {other:?}"),
    }
    match rx.recv().await.unwrap() {
        WsMessage::OrderRejected(event) => {
            assert_eq!(event.code, "INSUFFICIENT_HOLDINGS");
            assert!(event.request.is_some());
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(rx.try_recv().is_err());
}
