use rust_decimal::Decimal;

use crate::models::balance::BalanceMap;
use crate::models::ledger::LedgerData;
use crate::models::report::{CurrencyBalance, LedgerSummary};
use super::conversion_service::ConversionService;

/// Read-only projections of the ledger for display.
///
/// Nothing here mutates `LedgerData`; every call recomputes from the
/// current balance maps, rates and base currency.
pub struct ReportService {
    conversion: ConversionService,
}

impl ReportService {
    pub fn new() -> Self {
        Self {
            conversion: ConversionService::new(),
        }
    }

    /// Confirmed balances in the base currency.
    #[must_use]
    pub fn actual_total(&self, data: &LedgerData) -> Decimal {
        self.conversion.total_in_base_currency(
            &data.confirmed_balances,
            &data.base_currency,
            &data.exchange_rates,
        )
    }

    /// Pending income in the base currency.
    #[must_use]
    pub fn pending_total(&self, data: &LedgerData) -> Decimal {
        self.conversion.total_in_base_currency(
            &data.pending_balances,
            &data.base_currency,
            &data.exchange_rates,
        )
    }

    /// Confirmed plus pending, clamped to the `Decimal` range.
    #[must_use]
    pub fn grand_total(&self, data: &LedgerData) -> Decimal {
        combined_total(self.actual_total(data), self.pending_total(data))
    }

    /// `(currency, amount)` lines sorted by currency code, zero entries left out.
    ///
    /// Lazy and restartable: each call walks the map afresh.
    pub fn breakdown<'a>(
        &self,
        balances: &'a BalanceMap,
    ) -> impl Iterator<Item = CurrencyBalance> + 'a {
        balances.iter().map(|(currency, amount)| CurrencyBalance {
            currency: currency.clone(),
            amount,
        })
    }

    /// Totals, breakdowns and counts in a single snapshot.
    #[must_use]
    pub fn summary(&self, data: &LedgerData) -> LedgerSummary {
        let (actual_total, mut unconvertible) = self.conversion.total_with_unconvertible(
            &data.confirmed_balances,
            &data.base_currency,
            &data.exchange_rates,
        );
        let (pending_total, pending_unconvertible) = self.conversion.total_with_unconvertible(
            &data.pending_balances,
            &data.base_currency,
            &data.exchange_rates,
        );
        unconvertible.extend(pending_unconvertible);
        unconvertible.sort();
        unconvertible.dedup();

        LedgerSummary {
            base_currency: data.base_currency.clone(),
            actual_total,
            pending_total,
            grand_total: combined_total(actual_total, pending_total),
            confirmed: self.breakdown(&data.confirmed_balances).collect(),
            pending: self.breakdown(&data.pending_balances).collect(),
            unconvertible,
            operation_count: data.operations.len(),
            pending_count: data.operations.iter().filter(|op| op.is_pending()).count(),
        }
    }
}

fn combined_total(actual: Decimal, pending: Decimal) -> Decimal {
    actual.checked_add(pending).unwrap_or_else(|| {
        tracing::warn!(%actual, %pending, "grand total overflows, clamping");
        actual.saturating_add(pending)
    })
}

impl Default for ReportService {
    fn default() -> Self {
        Self::new()
    }
}
