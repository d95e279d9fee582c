use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::currency::Currency;

/// One line of a per-currency breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyBalance {
    pub currency: Currency,
    /// Amount in `currency` units (never zero in a breakdown)
    pub amount: Decimal,
}

/// Everything the main screen shows, computed in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSummary {
    /// Currency all totals are expressed in
    pub base_currency: Currency,

    /// Confirmed balances converted and summed
    pub actual_total: Decimal,

    /// Pending income converted and summed
    pub pending_total: Decimal,

    /// `actual_total + pending_total`
    pub grand_total: Decimal,

    /// Confirmed balances, sorted by currency code
    pub confirmed: Vec<CurrencyBalance>,

    /// Pending balances, sorted by currency code
    pub pending: Vec<CurrencyBalance>,

    /// Currencies left out of the totals for lack of an exchange rate
    pub unconvertible: Vec<Currency>,

    pub operation_count: usize,

    pub pending_count: usize,
}
