use chrono::{Local, NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::currency::Currency;

/// Direction of money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Income,
    Expense,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Income => write!(f, "Income"),
            OperationKind::Expense => write!(f, "Expense"),
        }
    }
}

/// Which slice of the operation log a listing should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperationFilter {
    #[default]
    All,
    /// Operations counted in the confirmed balances
    Confirmed,
    /// Expected income awaiting confirmation
    Pending,
}

impl OperationFilter {
    #[must_use]
    pub fn matches(&self, operation: &Operation) -> bool {
        match self {
            OperationFilter::All => true,
            OperationFilter::Confirmed => !operation.is_pending(),
            OperationFilter::Pending => operation.is_pending(),
        }
    }
}

/// Sort order for operation listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationSortOrder {
    /// Newest first (default for display)
    NewestFirst,
    /// Entry order
    OldestFirst,
    AmountDesc,
    AmountAsc,
    /// By currency code, then entry order
    Currency,
}

/// Timestamps are stored the way the ledger file has always stored them.
mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(
        value: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

pub use timestamp_format::FORMAT as TIMESTAMP_FORMAT;

/// A single income or expense record.
///
/// Immutable after creation except for the pending flag, which the ledger
/// flips from `true` to `false` exactly once when the income is confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,

    #[serde(alias = "type")]
    kind: OperationKind,

    #[serde(default)]
    name: String,

    /// Always positive, in `currency` units
    amount: Decimal,

    currency: Currency,

    #[serde(default)]
    comment: String,

    #[serde(rename = "timestamp", alias = "datetime", with = "timestamp_format")]
    created_at: NaiveDateTime,

    #[serde(default, alias = "is_pending")]
    pending: bool,
}

impl Operation {
    /// Build a record stamped with the current local time.
    /// Validation of amount and pending flag belongs to the ledger service.
    pub fn new(
        kind: OperationKind,
        name: impl Into<String>,
        amount: Decimal,
        currency: Currency,
        comment: impl Into<String>,
        pending: bool,
    ) -> Self {
        Self::at(kind, name, amount, currency, comment, pending, Local::now().naive_local())
    }

    /// Same as [`Operation::new`] with an explicit creation time (imports, tests).
    pub fn at(
        kind: OperationKind,
        name: impl Into<String>,
        amount: Decimal,
        currency: Currency,
        comment: impl Into<String>,
        pending: bool,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name: name.into(),
            amount,
            currency,
            comment: comment.into(),
            // Second precision, matching what survives a save/load cycle
            created_at: created_at.with_nanosecond(0).unwrap_or(created_at),
            pending,
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    #[must_use]
    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    #[must_use]
    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// `+amount` for income, `-amount` for expense.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            OperationKind::Income => self.amount,
            OperationKind::Expense => -self.amount,
        }
    }

    pub(crate) fn mark_confirmed(&mut self) {
        self.pending = false;
    }
}
