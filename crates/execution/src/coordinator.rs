// In crates/execution/src/coordinator.rs

use crate::{Error, Executor, LivePriceGuard, Result};
use async_trait::async_trait;
use chrono::Utc;
use core_types::{
    simulate, BookSource, ExecutionOutcome, OrderRequest, OrderTicket, OrderType, PortError,
    Settlement, SettlementRequest,
};
use events::{WsMessage, WsOrderExecuted, WsOrderRejected};
use risk::OrderValidator;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::Instrument;
use uuid::Uuid;

/// Runs a market order through validate, snapshot, simulate, guard and settle.
///
/// The coordinator holds no per-order state. Each call builds its own
/// snapshot, so two concurrent orders may both see the same liquidity; only
/// the settlement store keeps them from double-spending it.
pub struct ExecutionCoordinator {
    validator: Arc<dyn OrderValidator>,
    books: Arc<dyn BookSource>,
    settlement: Arc<dyn Settlement>,
    guard: Option<LivePriceGuard>,
    ws_tx: Option<broadcast::Sender<WsMessage>>,
}

impl ExecutionCoordinator {
    /// Creates a coordinator without a live guard or event publishing.
    ///
    /// # Arguments
    ///
    /// * `validator`: The pre-trade checks, always run first.
    /// * `books`: The source of the execution-time snapshot.
    /// * `settlement`: The transactional commit.
    pub fn new(
        validator: Arc<dyn OrderValidator>,
        books: Arc<dyn BookSource>,
        settlement: Arc<dyn Settlement>,
    ) -> Self {
        Self {
            validator,
            books,
            settlement,
            guard: None,
            ws_tx: None,
        }
    }

    /// Enables the live re-check of the execution price before settlement.
    pub fn with_live_guard(mut self, guard: LivePriceGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Publishes one `OrderExecuted` or `OrderRejected` event per attempt.
    pub fn with_events(mut self, ws_tx: broadcast::Sender<WsMessage>) -> Self {
        self.ws_tx = Some(ws_tx);
        self
    }

    pub fn has_live_guard(&self) -> bool {
        self.guard.is_some()
    }

    /// Converts a loosely-typed ticket and executes it.
    ///
    /// Incomplete tickets fail with `MissingParameters` before any I/O.
    pub async fn execute_ticket(&self, ticket: OrderTicket) -> Result<ExecutionOutcome> {
        match ticket.into_request() {
            Ok(request) => self.execute(&request).await,
            Err(e) => {
                let err = Error::from(e);
                tracing::info!(code = err.code(), error = %err, "Order ticket rejected");
                self.publish_rejection(&err, None);
                Err(err)
            }
        }
    }

    async fn run(&self, request: &OrderRequest) -> Result<ExecutionOutcome> {
        // --- 1. Reject malformed requests before any I/O ---
        if request.order_type != OrderType::Market {
            return Err(Error::UnsupportedOrderType(request.order_type));
        }
        if request.requested_size <= Decimal::ZERO {
            return Err(Error::InvalidSize(request.requested_size));
        }
        let blank: Vec<&'static str> = [
            ("userId", request.user_id.0.as_str()),
            ("marketId", request.market_id.0.as_str()),
            ("tokenId", request.token_id.0.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();
        if !blank.is_empty() {
            return Err(Error::MissingParameters(blank));
        }

        // --- 2. Validate ---
        self.validator.validate(request, self.books.as_ref()).await?;

        // --- 3. Snapshot ---
        let book = self.books.fetch_book(&request.token_id).await?;

        // --- 4. Simulate ---
        let fill = simulate(book.levels_for(request.side), request.requested_size);
        tracing::debug!(
            source = self.books.name(),
            filled = %fill.filled_size,
            remaining = %fill.remaining_size,
            total_cost = %fill.total_cost,
            levels = fill.levels_consumed,
            "Execution fill simulated"
        );

        // --- 5. All-or-nothing ---
        let avg_price = match fill.avg_price {
            Some(avg_price) if fill.is_complete() => avg_price,
            _ => {
                return Err(Error::PartialFillRejected {
                    requested: request.requested_size,
                    filled: fill.filled_size,
                });
            }
        };

        // --- 6. Live price guard ---
        if let Some(guard) = &self.guard {
            let reference = book.touch(request.side).unwrap_or(avg_price);
            guard.check(request, reference).await?;
        }

        // --- 7. Settle ---
        let settlement = SettlementRequest {
            client_order_id: Uuid::new_v4().to_string(),
            user_id: request.user_id.clone(),
            market_id: request.market_id.clone(),
            token_id: request.token_id.clone(),
            outcome: request.outcome.clone(),
            side: request.side,
            size: fill.filled_size,
            price: avg_price,
            total_cost: fill.total_cost,
        };
        let order_id = self
            .settlement
            .settle(&settlement)
            .await
            .map_err(|e| match e {
                PortError::Settlement(reason) => Error::SettlementError(reason),
                other => Error::SettlementError(other.to_string()),
            })?;

        tracing::info!(
            order_id = %order_id,
            client_order_id = %settlement.client_order_id,
            filled = %fill.filled_size,
            avg_price = %avg_price,
            total_cost = %fill.total_cost,
            "Order settled"
        );

        if let Some(tx) = &self.ws_tx {
            let _ = tx.send(WsMessage::OrderExecuted(WsOrderExecuted {
                timestamp: Utc::now(),
                client_order_id: settlement.client_order_id.clone(),
                order_id: order_id.clone(),
                user_id: settlement.user_id.clone(),
                market_id: settlement.market_id.clone(),
                token_id: settlement.token_id.clone(),
                side: settlement.side,
                filled_size: fill.filled_size,
                avg_price,
                total_cost: fill.total_cost,
            }));
        }

        Ok(ExecutionOutcome {
            success: true,
            filled_size: fill.filled_size,
            avg_price,
            total_cost: fill.total_cost,
            remaining_size: Decimal::ZERO,
            order_id,
        })
    }

    fn publish_rejection(&self, err: &Error, request: Option<&OrderRequest>) {
        if let Some(tx) = &self.ws_tx {
            let _ = tx.send(WsMessage::OrderRejected(WsOrderRejected {
                timestamp: Utc::now(),
                code: err.code(),
                reason: err.to_string(),
                request: request.cloned(),
            }));
        }
    }
}

#[async_trait]
impl Executor for ExecutionCoordinator {
    fn name(&self) -> &'static str {
        "ExecutionCoordinator"
    }

    async fn execute(&self, request: &OrderRequest) -> Result<ExecutionOutcome> {
        let span = tracing::info_span!(
            "execute",
            user_id = %request.user_id,
            market_id = %request.market_id,
            token_id = %request.token_id,
            side = %request.side,
            size = %request.requested_size,
            live_guard = self.guard.is_some(),
        );

        async {
            let result = self.run(request).await;
            if let Err(err) = &result {
                tracing::info!(code = err.code(), error = %err, "Order rejected");
                self.publish_rejection(err, Some(request));
            }
            result
        }
        .instrument(span)
        .await
    }
}
