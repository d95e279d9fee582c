use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::currency::Currency;
use crate::errors::CoreError;

/// Starter rates for a fresh install, quoted as "1 unit = rate RUB".
const STARTER_RATES: [(&str, i64, u32); 6] = [
    ("USD", 90, 0),
    ("EUR", 100, 0),
    ("RUB", 1, 0),
    ("KZT", 2, 1),
    ("UAH", 23, 1),
    ("BYN", 28, 0),
];

/// Current snapshot of exchange rates against the pivot currency (RUB).
///
/// `rates[c] = r` means 1 unit of `c` is worth `r` RUB. The pivot itself is
/// always present with rate 1, whatever a loaded document says.
/// Every stored rate is strictly positive; [`ExchangeRateTable::set_rate`]
/// is the only mutation path and rejects anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Decimal>", into = "BTreeMap<Currency, Decimal>")]
pub struct ExchangeRateTable {
    rates: BTreeMap<Currency, Decimal>,
}

impl ExchangeRateTable {
    /// A table holding only the implicit pivot entry.
    pub fn empty() -> Self {
        let mut rates = BTreeMap::new();
        rates.insert(Currency::pivot(), Decimal::ONE);
        Self { rates }
    }

    /// Rate of `currency` in pivot units, `None` when the table has no quote for it.
    #[must_use]
    pub fn rate(&self, currency: &Currency) -> Option<Decimal> {
        if currency.is_pivot() {
            return Some(Decimal::ONE);
        }
        self.rates.get(currency).copied()
    }

    #[must_use]
    pub fn contains(&self, currency: &Currency) -> bool {
        self.rate(currency).is_some()
    }

    /// Set the rate for `currency`, returning the previous one.
    ///
    /// Fails with `InvalidRate` when `rate <= 0` and with `PivotRateFixed`
    /// for the pivot; in both cases the table is left untouched.
    pub fn set_rate(
        &mut self,
        currency: Currency,
        rate: Decimal,
    ) -> Result<Option<Decimal>, CoreError> {
        if rate <= Decimal::ZERO {
            return Err(CoreError::InvalidRate {
                currency: currency.to_string(),
                rate,
            });
        }
        if currency.is_pivot() {
            return Err(CoreError::PivotRateFixed(currency.to_string()));
        }
        Ok(self.rates.insert(currency, rate))
    }

    /// All quoted currencies (pivot included), sorted by code.
    pub fn iter(&self) -> impl Iterator<Item = (&Currency, &Decimal)> {
        self.rates.iter()
    }

    pub fn currencies(&self) -> impl Iterator<Item = &Currency> {
        self.rates.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl Default for ExchangeRateTable {
    fn default() -> Self {
        let rates = STARTER_RATES
            .iter()
            .map(|&(code, mantissa, scale)| (Currency::new(code), Decimal::new(mantissa, scale)))
            .collect();
        Self { rates }
    }
}

impl From<BTreeMap<Currency, Decimal>> for ExchangeRateTable {
    /// Loaded maps are sanitized: non-positive quotes are dropped and the
    /// pivot is forced back to 1.
    fn from(raw: BTreeMap<Currency, Decimal>) -> Self {
        let mut rates: BTreeMap<Currency, Decimal> = raw
            .into_iter()
            .filter(|(currency, rate)| {
                let keep = *rate > Decimal::ZERO;
                if !keep {
                    tracing::warn!(
                        %currency,
                        %rate,
                        "dropping non-positive exchange rate from document"
                    );
                }
                keep
            })
            .collect();
        rates.insert(Currency::pivot(), Decimal::ONE);
        Self { rates }
    }
}

impl From<BTreeMap<String, Decimal>> for ExchangeRateTable {
    /// Keys differing only in case name the same currency. The key already
    /// written in canonical form wins over its variants.
    fn from(raw: BTreeMap<String, Decimal>) -> Self {
        let mut rates: BTreeMap<Currency, Decimal> = BTreeMap::new();
        for (key, rate) in raw {
            let currency = Currency::new(&key);
            if rates.contains_key(&currency) {
                tracing::warn!(
                    %currency,
                    key = %key,
                    "exchange rate key repeats a currency in another case"
                );
                if currency.as_str() != key {
                    continue;
                }
            }
            rates.insert(currency, rate);
        }
        Self::from(rates)
    }
}

impl From<ExchangeRateTable> for BTreeMap<Currency, Decimal> {
    fn from(table: ExchangeRateTable) -> Self {
        table.rates
    }
}
