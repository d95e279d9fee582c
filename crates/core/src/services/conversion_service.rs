use rust_decimal::Decimal;

use crate::errors::CoreError;
use crate::models::balance::BalanceMap;
use crate::models::currency::Currency;
use crate::models::rates::ExchangeRateTable;

/// Converts amounts between currencies through the pivot (RUB).
///
/// `from → RUB` multiplies by `rates[from]`, `RUB → to` divides by
/// `rates[to]`. Rates are assumed positive; the rate table refuses
/// anything else at the point where rates are set.
pub struct ConversionService;

impl ConversionService {
    pub fn new() -> Self {
        Self
    }

    /// Convert `amount` of `from` into `to`.
    ///
    /// Identity when `from == to`, even for currencies without a rate.
    /// Otherwise fails with `UnknownCurrency` for a missing non-pivot rate.
    pub fn convert(
        &self,
        amount: Decimal,
        from: &Currency,
        to: &Currency,
        rates: &ExchangeRateTable,
    ) -> Result<Decimal, CoreError> {
        if from == to {
            return Ok(amount);
        }

        let from_rate = rates
            .rate(from)
            .ok_or_else(|| CoreError::UnknownCurrency(from.to_string()))?;
        let to_rate = rates
            .rate(to)
            .ok_or_else(|| CoreError::UnknownCurrency(to.to_string()))?;

        let pivot_amount = amount.checked_mul(from_rate).ok_or_else(|| {
            CoreError::InvalidAmount(format!(
                "{amount} {from} overflows when converted to the pivot currency"
            ))
        })?;

        if to.is_pivot() {
            return Ok(pivot_amount);
        }

        pivot_amount.checked_div(to_rate).ok_or_else(|| {
            CoreError::InvalidAmount(format!("{amount} {from} cannot be expressed in {to}"))
        })
    }

    /// Sum of every balance converted into `base`.
    ///
    /// Balances that cannot be converted are left out instead of failing the
    /// whole total, so one stale currency code never blanks the display.
    #[must_use]
    pub fn total_in_base_currency(
        &self,
        balances: &BalanceMap,
        base: &Currency,
        rates: &ExchangeRateTable,
    ) -> Decimal {
        self.total_with_unconvertible(balances, base, rates).0
    }

    /// Like [`ConversionService::total_in_base_currency`], also reporting
    /// which currencies were skipped.
    pub fn total_with_unconvertible(
        &self,
        balances: &BalanceMap,
        base: &Currency,
        rates: &ExchangeRateTable,
    ) -> (Decimal, Vec<Currency>) {
        let mut total = Decimal::ZERO;
        let mut skipped = Vec::new();

        for (currency, amount) in balances.iter() {
            let converted = self
                .convert(amount, currency, base, rates)
                .and_then(|value| {
                    total.checked_add(value).ok_or_else(|| {
                        CoreError::InvalidAmount(format!("total in {base} overflows"))
                    })
                });
            match converted {
                Ok(sum) => total = sum,
                Err(e) => {
                    tracing::debug!(%currency, %base, error = %e, "excluding balance from total");
                    skipped.push(currency.clone());
                }
            }
        }

        (total, skipped)
    }
}

impl Default for ConversionService {
    fn default() -> Self {
        Self::new()
    }
}
