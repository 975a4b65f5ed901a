use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;

/// Trait for external USD price sources
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Fetch USD prices for `symbols` in one batched request.
    ///
    /// The returned map is keyed by upper-case symbol and only contains the
    /// symbols the source actually quoted.
    async fn fetch_usd_prices(&self, symbols: &[String]) -> Result<HashMap<String, f64>>;
}
