// In crates/execution/src/lib.rs

use async_trait::async_trait;
use core_types::{ExecutionOutcome, OrderRequest};

pub mod coordinator;
pub mod error;
pub mod guard;

// Re-export public types
pub use coordinator::ExecutionCoordinator;
pub use error::{Error, Result};
pub use guard::LivePriceGuard;

/// The universal interface for an execution handler.
///
/// An `Executor` takes a market order through to settlement, or refuses it.
/// A refusal never leaves any ledger side effect behind.
#[async_trait]
pub trait Executor: Send + Sync {
    /// The name of the executor (e.g., "ExecutionCoordinator").
    fn name(&self) -> &'static str;

    /// Executes a given order request.
    ///
    /// # Arguments
    ///
    /// * `request`: The market order to fill.
    ///
    /// # Returns
    ///
    /// The settled `ExecutionOutcome`, or the `Error` that ended the attempt.
    async fn execute(&self, request: &OrderRequest) -> Result<ExecutionOutcome>;
}
