// In crates/execution/src/guard.rs

use crate::{Error, Result};
use core_types::decimal::relative_deviation;
use core_types::{BookSource, OrderRequest, Side};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Re-checks the execution price against a live quote right before settlement.
///
/// The quote source owns its connection lifecycle and timeout; the guard
/// only compares prices. A missing quote rejects the trade instead of
/// skipping the check.
#[derive(Clone)]
pub struct LivePriceGuard {
    quotes: Arc<dyn BookSource>,
    tolerance: Decimal,
}

impl LivePriceGuard {
    /// # Arguments
    /// * `quotes` - A one-shot live snapshot source.
    /// * `tolerance` - Maximum relative deviation, e.g. `0.005` for 0.5%.
    pub fn new(quotes: Arc<dyn BookSource>, tolerance: Decimal) -> Self {
        Self { quotes, tolerance }
    }

    pub fn tolerance(&self) -> Decimal {
        self.tolerance
    }

    /// Compares the submitted price with the live best ask (buy) or best bid (sell).
    ///
    /// Without a submitted price, `reference_price` stands in for it. Callers
    /// pass the best price of the snapshot they executed against, so a
    /// multi-level fill is judged on where the book stood, not on its average.
    pub async fn check(&self, request: &OrderRequest, reference_price: Decimal) -> Result<()> {
        let submitted = request.price.unwrap_or(reference_price);
        let live_book = self.quotes.fetch_book(&request.token_id).await?;

        let live = live_book.touch(request.side).ok_or_else(|| {
            let side = match request.side {
                Side::Buy => "ask",
                Side::Sell => "bid",
            };
            Error::ExternalFetchError(format!("live book for {} has no {side}", request.token_id))
        })?;

        let deviation = relative_deviation(submitted, live).ok_or_else(|| {
            Error::ExternalFetchError(format!("live {} quote is zero", request.token_id))
        })?;

        tracing::debug!(
            source = self.quotes.name(),
            submitted = %submitted,
            live = %live,
            deviation = %deviation,
            "Live price check"
        );

        if deviation > self.tolerance {
            tracing::warn!(
                token_id = %request.token_id,
                submitted = %submitted,
                live = %live,
                tolerance = %self.tolerance,
                "Price moved beyond tolerance"
            );
            return Err(Error::PriceMovedUnfavorably {
                submitted,
                live,
                tolerance: self.tolerance,
            });
        }
        Ok(())
    }
}
