// In crates/risk/src/pre_trade.rs

use crate::{Error, OrderValidator, Result};
use async_trait::async_trait;
use core_types::{
    simulate, BookSource, LedgerStore, MarketStore, OrderRequest, PortError, Side,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Validates market orders against market flags, holdings, balance and the book.
///
/// Rules, in order:
/// 1. The market must be active, not closed and not archived.
/// 2. A sell must not exceed the user's holdings of the token.
/// 3. A buy must be fully fillable from the asks, and its worst-case cost
///    must not exceed the user's balance.
pub struct PreTradeValidator {
    markets: Arc<dyn MarketStore>,
    ledger: Arc<dyn LedgerStore>,
    store_timeout: Duration,
}

impl PreTradeValidator {
    /// # Arguments
    /// * `store_timeout` - Upper bound on each individual store lookup.
    pub fn new(
        markets: Arc<dyn MarketStore>,
        ledger: Arc<dyn LedgerStore>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            markets,
            ledger,
            store_timeout,
        }
    }

    async fn bounded<T>(&self, lookup: impl Future<Output = core_types::PortResult<T>>) -> Result<T> {
        match tokio::time::timeout(self.store_timeout, lookup).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(PortError::Timeout(self.store_timeout).into()),
        }
    }

    async fn check_market(&self, request: &OrderRequest) -> Result<()> {
        let status = self.bounded(self.markets.market_status(&request.market_id)).await?;
        if !status.is_tradable() {
            tracing::info!(market_id = %request.market_id, ?status, "Order refused: market not tradable");
            return Err(Error::MarketInactive {
                market_id: request.market_id.clone(),
            });
        }
        Ok(())
    }

    async fn check_holdings(&self, request: &OrderRequest) -> Result<()> {
        let held = self
            .bounded(self.ledger.holdings(&request.user_id, &request.market_id, &request.token_id))
            .await?;
        if held < request.requested_size {
            tracing::info!(
                user_id = %request.user_id,
                token_id = %request.token_id,
                requested = %request.requested_size,
                held = %held,
                "Order refused: insufficient holdings"
            );
            return Err(Error::InsufficientHoldings {
                requested: request.requested_size,
                held,
            });
        }
        Ok(())
    }

    async fn check_buy(&self, request: &OrderRequest, books: &dyn BookSource) -> Result<()> {
        let balance = self.bounded(self.ledger.balance(&request.user_id)).await?;
        let book = books.fetch_book(&request.token_id).await?;

        let fill = simulate(&book.asks, request.requested_size);
        if !fill.is_complete() {
            tracing::info!(
                token_id = %request.token_id,
                requested = %request.requested_size,
                available = %fill.filled_size,
                "Order refused: insufficient liquidity"
            );
            return Err(Error::InsufficientLiquidity {
                requested: request.requested_size,
                available: fill.filled_size,
            });
        }

        if fill.total_cost > balance {
            tracing::info!(
                user_id = %request.user_id,
                required = %fill.total_cost,
                available = %balance,
                "Order refused: insufficient balance"
            );
            return Err(Error::InsufficientBalance {
                required: fill.total_cost,
                available: balance,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl OrderValidator for PreTradeValidator {
    fn name(&self) -> &'static str {
        "PreTradeValidator"
    }

    async fn validate(&self, request: &OrderRequest, books: &dyn BookSource) -> Result<()> {
        self.check_market(request).await?;
        match request.side {
            Side::Sell => self.check_holdings(request).await,
            Side::Buy => self.check_buy(request, books).await,
        }
    }
}
