use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::balance::BalanceMap;
use crate::models::currency::Currency;
use crate::models::ledger::LedgerData;
use crate::models::operation::{Operation, OperationKind};

/// Owns the mutation rules of the ledger: the operation log plus the two
/// derived balance maps, kept in step incrementally.
///
/// After every successful call:
/// - `confirmed_balances[c]` is the signed sum of non-pending operations in `c`
/// - `pending_balances[c]` is the sum of pending income in `c`
/// - no expense is pending
///
/// Failed calls leave `LedgerData` untouched. Pure business logic, no I/O.
pub struct LedgerService;

impl LedgerService {
    pub fn new() -> Self {
        Self
    }

    /// Append a new operation and book it into the matching balance map.
    pub fn add_operation(
        &self,
        data: &mut LedgerData,
        operation: Operation,
    ) -> Result<Uuid, CoreError> {
        self.validate_operation(&operation)?;
        let id = operation.id();
        Self::book(data, &operation, Decimal::ONE)?;
        data.operations.push(operation);
        Ok(id)
    }

    /// Move a pending income into the confirmed balances, in place.
    pub fn confirm_pending(&self, data: &mut LedgerData, id: Uuid) -> Result<(), CoreError> {
        let idx = Self::position(data, id)?;
        if !data.operations[idx].is_pending() {
            return Err(CoreError::AlreadyConfirmed(id));
        }

        let operation = &mut data.operations[idx];
        // Only the confirmed side can overflow: the pending entry holds at
        // least this amount and just shrinks.
        data.confirmed_balances
            .apply(operation.currency(), operation.signed_amount())?;
        data.pending_balances
            .apply(operation.currency(), -operation.amount())?;
        operation.mark_confirmed();
        Ok(())
    }

    /// Remove an operation, reversing its contribution to whichever map holds it.
    pub fn delete_operation(
        &self,
        data: &mut LedgerData,
        id: Uuid,
    ) -> Result<Operation, CoreError> {
        let idx = Self::position(data, id)?;
        let (pending, currency, delta) =
            Self::contribution(&data.operations[idx], Decimal::NEGATIVE_ONE);
        Self::book_delta(data, pending, &currency, delta)?;
        Ok(data.operations.remove(idx))
    }

    /// Drop every operation and both balance maps. Returns how many operations went.
    pub fn clear_all(&self, data: &mut LedgerData) -> usize {
        let removed = data.operations.len();
        data.operations.clear();
        data.confirmed_balances.clear();
        data.pending_balances.clear();
        removed
    }

    pub fn set_base_currency(&self, data: &mut LedgerData, code: &str) -> Result<(), CoreError> {
        data.base_currency = Currency::parse(code)?;
        Ok(())
    }

    /// Set a rate in pivot units. Returns the rate it replaced.
    pub fn set_exchange_rate(
        &self,
        data: &mut LedgerData,
        code: &str,
        rate: Decimal,
    ) -> Result<Option<Decimal>, CoreError> {
        let currency = Currency::parse(code)?;
        data.exchange_rates.set_rate(currency, rate)
    }

    /// Derive both balance maps from scratch by scanning the log.
    ///
    /// Fails with `InvalidAmount` when a running sum overflows.
    pub fn recompute_balances(
        &self,
        operations: &[Operation],
    ) -> Result<(BalanceMap, BalanceMap), CoreError> {
        let mut confirmed = BalanceMap::new();
        let mut pending = BalanceMap::new();
        for operation in operations {
            if operation.is_pending() {
                pending.apply(operation.currency(), operation.amount())?;
            } else {
                confirmed.apply(operation.currency(), operation.signed_amount())?;
            }
        }
        Ok((confirmed, pending))
    }

    /// `true` when the stored maps agree with a full recomputation.
    #[must_use]
    pub fn balances_consistent(&self, data: &LedgerData) -> bool {
        match self.recompute_balances(&data.operations) {
            Ok((confirmed, pending)) => {
                confirmed == data.confirmed_balances && pending == data.pending_balances
            }
            Err(_) => false,
        }
    }

    /// Bring a freshly loaded document back within the ledger invariants.
    ///
    /// Operations with a non-positive amount are dropped, pending expenses are
    /// treated as confirmed, and balance maps that disagree with the log are
    /// rebuilt from it. Operations whose amount would overflow a balance during
    /// the rebuild are dropped too. Returns `true` when anything had to change.
    pub fn repair(&self, data: &mut LedgerData) -> bool {
        let mut repaired = false;

        let before = data.operations.len();
        data.operations.retain(|op| {
            let keep = op.amount() > Decimal::ZERO;
            if !keep {
                tracing::warn!(
                    id = %op.id(),
                    amount = %op.amount(),
                    "dropping operation with non-positive amount"
                );
            }
            keep
        });
        repaired |= data.operations.len() != before;

        for op in data.operations.iter_mut() {
            if op.is_pending() && op.kind() == OperationKind::Expense {
                tracing::warn!(
                    id = %op.id(),
                    "pending expense found in document, treating it as confirmed"
                );
                op.mark_confirmed();
                repaired = true;
            }
        }

        data.confirmed_balances.normalize();
        data.pending_balances.normalize();

        if !self.balances_consistent(data) {
            tracing::warn!("stored balances disagree with the operation log, rebuilding them");
            Self::rebuild(data);
            repaired = true;
        }

        repaired
    }

    /// Validate an operation before it enters the log.
    ///
    /// Rules:
    /// - Amount must be positive
    /// - Currency code must not be blank
    /// - Only income may be pending
    fn validate_operation(&self, operation: &Operation) -> Result<(), CoreError> {
        if operation.amount() <= Decimal::ZERO {
            return Err(CoreError::InvalidAmount(format!(
                "{} must be greater than zero",
                operation.amount()
            )));
        }
        if operation.currency().as_str().is_empty() {
            return Err(CoreError::InvalidCurrency(String::new()));
        }
        if operation.is_pending() && operation.kind() != OperationKind::Income {
            return Err(CoreError::InvalidPendingFlag);
        }
        Ok(())
    }

    /// Apply `sign * contribution` of `operation` to the map it belongs to.
    /// Nothing changes when the new balance would overflow.
    fn book(data: &mut LedgerData, operation: &Operation, sign: Decimal) -> Result<(), CoreError> {
        let (pending, currency, delta) = Self::contribution(operation, sign);
        Self::book_delta(data, pending, &currency, delta)
    }

    fn contribution(operation: &Operation, sign: Decimal) -> (bool, Currency, Decimal) {
        let amount = if operation.is_pending() {
            operation.amount()
        } else {
            operation.signed_amount()
        };
        (operation.is_pending(), operation.currency().clone(), sign * amount)
    }

    fn book_delta(
        data: &mut LedgerData,
        pending: bool,
        currency: &Currency,
        delta: Decimal,
    ) -> Result<(), CoreError> {
        let balances = if pending {
            &mut data.pending_balances
        } else {
            &mut data.confirmed_balances
        };
        balances.apply(currency, delta)
    }

    /// Replace both maps with sums over the log, dropping operations that
    /// cannot be added without overflow.
    fn rebuild(data: &mut LedgerData) {
        data.confirmed_balances.clear();
        data.pending_balances.clear();
        let operations = std::mem::take(&mut data.operations);
        for operation in operations {
            match Self::book(data, &operation, Decimal::ONE) {
                Ok(()) => data.operations.push(operation),
                Err(e) => tracing::warn!(
                    id = %operation.id(),
                    error = %e,
                    "dropping operation that overflows its balance"
                ),
            }
        }
    }

    fn position(data: &LedgerData, id: Uuid) -> Result<usize, CoreError> {
        data.operations
            .iter()
            .position(|op| op.id() == id)
            .ok_or(CoreError::NotFound(id))
    }
}

impl Default for LedgerService {
    fn default() -> Self {
        Self::new()
    }
}
