use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::errors::CoreError;
use crate::models::currency::Currency;

/// Source of current exchange-rate quotes against the pivot currency (RUB).
///
/// Quotes follow the rate-table convention: `1 unit = rate RUB`.
/// Only a snapshot is ever fetched; there is no history.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait RateProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Latest quote for every currency the provider knows.
    async fn fetch_rates(&self) -> Result<BTreeMap<Currency, Decimal>, CoreError>;
}
