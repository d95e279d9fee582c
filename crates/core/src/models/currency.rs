use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Code of the currency every exchange rate is quoted against.
/// Its own rate is implicitly 1 and never user-editable.
pub const PIVOT_CURRENCY: &str = "RUB";

/// A currency code such as "RUB" or "USD".
///
/// Not a closed set: codes typed by the user at runtime are accepted as-is,
/// only trimmed and uppercased so that "usd " and "USD" hit the same balance.
///
/// Codes are case-insensitive everywhere, loaded documents included: map keys
/// that differ only in case ("usd" and "USD") collapse into one currency when
/// read. Balance entries are summed, and for exchange rates the upper-case
/// key wins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_uppercase())
    }

    /// Like [`Currency::new`], but rejects codes that are empty after trimming.
    pub fn parse(code: impl AsRef<str>) -> Result<Self, CoreError> {
        let currency = Self::new(code.as_ref());
        if currency.0.is_empty() {
            return Err(CoreError::InvalidCurrency(code.as_ref().to_string()));
        }
        Ok(currency)
    }

    pub fn pivot() -> Self {
        Self(PIVOT_CURRENCY.to_string())
    }

    #[must_use]
    pub fn is_pivot(&self) -> bool {
        self.0 == PIVOT_CURRENCY
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Currency {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl From<&str> for Currency {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::pivot()
    }
}
