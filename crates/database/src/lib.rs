// In crates/database/src/lib.rs

use app_config::types::DatabaseSettings;
use async_trait::async_trait;
use core_types::{
    LedgerStore, MarketId, MarketStatus, MarketStore, OrderId, PortError, PortResult, Settlement,
    SettlementRequest, TokenId, UserId,
};
use rust_decimal::Decimal;
use sqlx::{PgPool, postgres::PgPoolOptions};

pub mod error;

// Re-export the most important types for easy access.
pub use error::{Error, Result};

/// A wrapper around the `sqlx` connection pool.
///
/// Implements the market, ledger and settlement ports on top of the schema in
/// `migrations/`.
#[derive(Debug, Clone)]
pub struct Db(PgPool);

/// Establishes a connection pool to the PostgreSQL database and runs migrations.
///
/// # Arguments
///
/// * `settings`: The database configuration settings.
///
/// # Returns
///
/// A `Result` containing the `Db` wrapper on success, or an `Error` on failure.
pub async fn connect(settings: &DatabaseSettings) -> Result<Db> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.url)
        .await?;

    // Run database migrations. This ensures the settlement function exists.
    sqlx::migrate!("../../migrations").run(&pool).await.map_err(Error::from)?;

    tracing::info!(max_connections = settings.max_connections, "Database connected and migrated");
    Ok(Db(pool))
}

impl Db {
    pub fn pool(&self) -> &PgPool {
        &self.0
    }
}

#[async_trait]
impl MarketStore for Db {
    async fn market_status(&self, market_id: &MarketId) -> PortResult<MarketStatus> {
        let row: Option<(bool, bool, bool)> =
            sqlx::query_as("SELECT active, closed, archived FROM markets WHERE id = $1")
                .bind(&market_id.0)
                .fetch_optional(&self.0)
                .await
                .map_err(error::lookup_failed)?;

        let (active, closed, archived) =
            row.ok_or_else(|| PortError::NotFound(format!("market {market_id}")))?;
        Ok(MarketStatus {
            active,
            closed,
            archived,
        })
    }
}

#[async_trait]
impl LedgerStore for Db {
    async fn balance(&self, user_id: &UserId) -> PortResult<Decimal> {
        let balance: Option<Decimal> =
            sqlx::query_scalar("SELECT balance FROM user_balances WHERE user_id = $1")
                .bind(&user_id.0)
                .fetch_optional(&self.0)
                .await
                .map_err(error::lookup_failed)?;
        Ok(balance.unwrap_or_default())
    }

    async fn holdings(
        &self,
        user_id: &UserId,
        market_id: &MarketId,
        token_id: &TokenId,
    ) -> PortResult<Decimal> {
        let size: Option<Decimal> = sqlx::query_scalar(
            "SELECT size FROM holdings WHERE user_id = $1 AND market_id = $2 AND token_id = $3",
        )
        .bind(&user_id.0)
        .bind(&market_id.0)
        .bind(&token_id.0)
        .fetch_optional(&self.0)
        .await
        .map_err(error::lookup_failed)?;
        Ok(size.unwrap_or_default())
    }
}

#[async_trait]
impl Settlement for Db {
    /// Commits the trade through `execute_market_order` in one transaction.
    ///
    /// The function locks the user's balance row (and holdings row on a sell)
    /// so concurrent trades for one user cannot both spend the same funds.
    async fn settle(&self, request: &SettlementRequest) -> PortResult<OrderId> {
        let mut tx = self.0.begin().await.map_err(error::settlement_failed)?;

        let order_id: String = sqlx::query_scalar(
            "SELECT execute_market_order($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&request.client_order_id)
        .bind(&request.user_id.0)
        .bind(&request.market_id.0)
        .bind(&request.token_id.0)
        .bind(&request.outcome)
        .bind(request.side.as_str())
        .bind(request.size)
        .bind(request.price)
        .bind(request.total_cost)
        .fetch_one(&mut *tx)
        .await
        .map_err(error::settlement_failed)?;

        // Dropping `tx` on any error above rolls back.
        tx.commit().await.map_err(error::settlement_failed)?;

        tracing::debug!(
            order_id = %order_id,
            client_order_id = %request.client_order_id,
            "Settlement committed"
        );
        Ok(OrderId(order_id))
    }
}
