// In crates/risk/src/lib.rs

use async_trait::async_trait;
use core_types::{BookSource, OrderRequest};

pub mod error;
pub mod pre_trade;

// Re-export public types
pub use error::{Error, Result};
pub use pre_trade::PreTradeValidator;

/// The universal interface for a pre-trade check.
///
/// An `OrderValidator` decides whether an order may proceed to execution. It
/// never mutates any state: a refusal is a clean abort.
#[async_trait]
pub trait OrderValidator: Send + Sync {
    /// The name of the validation policy.
    fn name(&self) -> &'static str;

    /// Checks an order against market state, the user's ledger and current liquidity.
    ///
    /// # Arguments
    ///
    /// * `request`: The fully-formed market order.
    /// * `books`: Where to fetch the book from, if the check needs one. Sells are
    ///   decided on holdings alone and never touch it.
    ///
    /// # Returns
    ///
    /// * `Ok(())`: The order may proceed.
    /// * `Err(Error)`: The first rule the order violates.
    async fn validate(&self, request: &OrderRequest, books: &dyn BookSource) -> Result<()>;
}
