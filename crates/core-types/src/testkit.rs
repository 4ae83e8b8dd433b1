// In crates/core-types/src/testkit.rs

//! In-memory collaborators for tests. Enabled with the `testkit` feature.

use crate::ports::{PortError, PortResult};
use crate::{
    BookSource, LedgerStore, MarketId, MarketStatus, MarketStore, OrderBookLevel,
    OrderBookSnapshot, OrderId, Settlement, SettlementRequest, TokenId, UserId,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Builds a snapshot from `(price, size)` pairs.
pub fn snapshot(
    token_id: &str,
    bids: &[(Decimal, Decimal)],
    asks: &[(Decimal, Decimal)],
) -> OrderBookSnapshot {
    let to_levels = |pairs: &[(Decimal, Decimal)]| {
        pairs
            .iter()
            .map(|(price, size)| OrderBookLevel::new(*price, *size))
            .collect()
    };
    OrderBookSnapshot::from_levels(TokenId(token_id.to_string()), to_levels(bids), to_levels(asks))
}

/// Serves a queue of snapshots, repeating the last one once the queue runs dry.
pub struct StaticBookSource {
    books: Mutex<Vec<PortResult<OrderBookSnapshot>>>,
    calls: AtomicUsize,
}

impl StaticBookSource {
    pub fn new(book: OrderBookSnapshot) -> Self {
        Self::sequence(vec![Ok(book)])
    }

    /// Each call pops the next result; the final entry is returned forever.
    pub fn sequence(books: Vec<PortResult<OrderBookSnapshot>>) -> Self {
        Self {
            books: Mutex::new(books),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: PortError) -> Self {
        Self::sequence(vec![Err(error)])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BookSource for StaticBookSource {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch_book(&self, _token_id: &TokenId) -> PortResult<OrderBookSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut books = self.books.lock().unwrap();
        if books.len() > 1 {
            books.remove(0)
        } else {
            books
                .first()
                .cloned()
                .unwrap_or_else(|| Err(PortError::Fetch("no book configured".into())))
        }
    }
}

/// A ledger, market registry and settlement store held in memory.
///
/// `settle` applies the trade to balances and holdings so tests can assert on
/// the ledger afterwards. Calls are counted per operation.
#[derive(Default)]
pub struct InMemoryLedger {
    markets: Mutex<HashMap<MarketId, MarketStatus>>,
    balances: Mutex<HashMap<UserId, Decimal>>,
    holdings: Mutex<HashMap<(UserId, MarketId, TokenId), Decimal>>,
    settlements: Mutex<Vec<SettlementRequest>>,
    settlement_failure: Mutex<Option<String>>,
    lookups: AtomicUsize,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_market(self, market_id: &str, status: MarketStatus) -> Self {
        self.markets
            .lock()
            .unwrap()
            .insert(MarketId(market_id.to_string()), status);
        self
    }

    pub fn with_balance(self, user_id: &str, balance: Decimal) -> Self {
        self.balances
            .lock()
            .unwrap()
            .insert(UserId(user_id.to_string()), balance);
        self
    }

    pub fn with_holdings(self, user_id: &str, market_id: &str, token_id: &str, size: Decimal) -> Self {
        self.holdings.lock().unwrap().insert(
            (
                UserId(user_id.to_string()),
                MarketId(market_id.to_string()),
                TokenId(token_id.to_string()),
            ),
            size,
        );
        self
    }

    /// Makes every subsequent `settle` call fail with `reason`.
    pub fn failing_settlement(self, reason: &str) -> Self {
        *self.settlement_failure.lock().unwrap() = Some(reason.to_string());
        self
    }

    pub fn settlements(&self) -> Vec<SettlementRequest> {
        self.settlements.lock().unwrap().clone()
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn balance_of(&self, user_id: &str) -> Decimal {
        self.balances
            .lock()
            .unwrap()
            .get(&UserId(user_id.to_string()))
            .copied()
            .unwrap_or_default()
    }

    pub fn holdings_of(&self, user_id: &str, market_id: &str, token_id: &str) -> Decimal {
        self.holdings
            .lock()
            .unwrap()
            .get(&(
                UserId(user_id.to_string()),
                MarketId(market_id.to_string()),
                TokenId(token_id.to_string()),
            ))
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait]
impl MarketStore for InMemoryLedger {
    async fn market_status(&self, market_id: &MarketId) -> PortResult<MarketStatus> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.markets
            .lock()
            .unwrap()
            .get(market_id)
            .copied()
            .ok_or_else(|| PortError::NotFound(format!("market {market_id}")))
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn balance(&self, user_id: &UserId) -> PortResult<Decimal> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(user_id)
            .copied()
            .unwrap_or_default())
    }

    async fn holdings(
        &self,
        user_id: &UserId,
        market_id: &MarketId,
        token_id: &TokenId,
    ) -> PortResult<Decimal> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .holdings
            .lock()
            .unwrap()
            .get(&(user_id.clone(), market_id.clone(), token_id.clone()))
            .copied()
            .unwrap_or_default())
    }
}

#[async_trait]
impl Settlement for InMemoryLedger {
    async fn settle(&self, request: &SettlementRequest) -> PortResult<OrderId> {
        if let Some(reason) = self.settlement_failure.lock().unwrap().clone() {
            return Err(PortError::Settlement(reason));
        }

        let signed_cost = match request.side {
            crate::Side::Buy => -request.total_cost,
            crate::Side::Sell => request.total_cost,
        };
        let signed_size = match request.side {
            crate::Side::Buy => request.size,
            crate::Side::Sell => -request.size,
        };

        *self
            .balances
            .lock()
            .unwrap()
            .entry(request.user_id.clone())
            .or_default() += signed_cost;
        *self
            .holdings
            .lock()
            .unwrap()
            .entry((
                request.user_id.clone(),
                request.market_id.clone(),
                request.token_id.clone(),
            ))
            .or_default() += signed_size;

        let mut settlements = self.settlements.lock().unwrap();
        settlements.push(request.clone());
        Ok(OrderId(format!("order-{}", settlements.len())))
    }
}
