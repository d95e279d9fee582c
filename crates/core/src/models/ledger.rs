use serde::{Deserialize, Serialize};

use super::balance::BalanceMap;
use super::currency::Currency;
use super::operation::Operation;
use super::rates::ExchangeRateTable;
use super::settings::NameSuggestions;

/// The main data container. Everything in here is written to the ledger
/// document on every save and read back on start.
///
/// Every field falls back to its default when the document lacks it, so a
/// missing or partially written file reads as a fresh install.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LedgerData {
    /// Entry-ordered log of every live operation, confirmed and pending
    pub operations: Vec<Operation>,

    /// Signed sums of confirmed operations per currency
    #[serde(alias = "currencies")]
    pub confirmed_balances: BalanceMap,

    /// Sums of pending income per currency
    #[serde(alias = "pending_currencies")]
    pub pending_balances: BalanceMap,

    /// Currency all aggregate totals are shown in
    #[serde(alias = "base_currency")]
    pub base_currency: Currency,

    #[serde(alias = "exchange_rates")]
    pub exchange_rates: ExchangeRateTable,

    /// Entry-form hints, stored as `expenseNames` / `incomeNames`
    #[serde(flatten)]
    pub names: NameSuggestions,
}

impl Default for LedgerData {
    fn default() -> Self {
        Self {
            operations: Vec::new(),
            confirmed_balances: BalanceMap::new(),
            pending_balances: BalanceMap::new(),
            base_currency: Currency::pivot(),
            exchange_rates: ExchangeRateTable::default(),
            names: NameSuggestions::default(),
        }
    }
}
