use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::currency::Currency;
use crate::errors::CoreError;

/// Per-currency running sums.
///
/// Sparse: an entry that reaches exactly zero is removed, so absence and
/// zero mean the same thing and two maps with equal sums compare equal.
///
/// Loaded keys go through [`Currency::new`]; keys that only differ in case
/// ("usd" and "USD") are summed into one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Decimal>", into = "BTreeMap<Currency, Decimal>")]
pub struct BalanceMap {
    entries: BTreeMap<Currency, Decimal>,
}

impl BalanceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance for `currency`, zero when absent.
    #[must_use]
    pub fn get(&self, currency: &Currency) -> Decimal {
        self.entries.get(currency).copied().unwrap_or(Decimal::ZERO)
    }

    /// Add a signed `delta`, dropping the entry if the sum lands on zero.
    ///
    /// Fails with `InvalidAmount` when the sum leaves the `Decimal` range;
    /// the map is unchanged in that case.
    pub fn apply(&mut self, currency: &Currency, delta: Decimal) -> Result<(), CoreError> {
        if delta.is_zero() {
            return Ok(());
        }
        let sum = self.checked_sum(currency, delta)?;
        if sum.is_zero() {
            self.entries.remove(currency);
        } else {
            self.entries.insert(currency.clone(), sum);
        }
        Ok(())
    }

    /// The balance `currency` would have after `apply(currency, delta)`, without applying it.
    pub fn checked_sum(&self, currency: &Currency, delta: Decimal) -> Result<Decimal, CoreError> {
        self.get(currency).checked_add(delta).ok_or_else(|| {
            CoreError::InvalidAmount(format!("{currency} balance overflows when adding {delta}"))
        })
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Non-zero entries sorted by currency code.
    pub fn iter(&self) -> impl Iterator<Item = (&Currency, Decimal)> + '_ {
        self.entries
            .iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(currency, amount)| (currency, *amount))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Drop explicit zero entries a loaded document may carry.
    pub fn normalize(&mut self) {
        self.entries.retain(|_, amount| !amount.is_zero());
    }
}

impl FromIterator<(Currency, Decimal)> for BalanceMap {
    /// Entries for the same currency are summed. An entry that would overflow
    /// the running sum is left out.
    fn from_iter<I: IntoIterator<Item = (Currency, Decimal)>>(iter: I) -> Self {
        let mut map = BalanceMap::new();
        for (currency, amount) in iter {
            if let Err(e) = map.apply(&currency, amount) {
                tracing::warn!(%currency, %amount, error = %e, "dropping balance entry");
            }
        }
        map
    }
}

impl From<BTreeMap<String, Decimal>> for BalanceMap {
    fn from(raw: BTreeMap<String, Decimal>) -> Self {
        raw.into_iter()
            .map(|(code, amount)| (Currency::new(code), amount))
            .collect()
    }
}

impl From<BalanceMap> for BTreeMap<Currency, Decimal> {
    fn from(map: BalanceMap) -> Self {
        map.entries
    }
}

/// Selects one of the ledger's two balance maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceKind {
    /// Signed sums of confirmed operations
    Confirmed,
    /// Expected income not yet confirmed
    Pending,
}
