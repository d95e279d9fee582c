pub mod config;
pub mod display;
pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use rust_decimal::Decimal;
use std::sync::Once;
use uuid::Uuid;

use config::LedgerConfig;
use errors::CoreError;
use models::{
    balance::{BalanceKind, BalanceMap},
    currency::{Currency, PIVOT_CURRENCY},
    ledger::LedgerData,
    operation::{Operation, OperationFilter, OperationKind, OperationSortOrder, TIMESTAMP_FORMAT},
    rates::ExchangeRateTable,
    report::{CurrencyBalance, LedgerSummary},
    settings::NameSuggestions,
};
use providers::traits::RateProvider;
use services::{
    conversion_service::ConversionService, ledger_service::LedgerService,
    report_service::ReportService,
};
use storage::traits::LedgerStore;

static INIT_TRACING: Once = Once::new();

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `finance_ledger_core=info`).
/// Safe to call more than once; only the first call does anything.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("finance_ledger_core=info"));
        if fmt().with_env_filter(filter).try_init().is_ok() {
            tracing::info!("finance ledger tracing initialized");
        }
    });
}

/// Main entry point for the finance ledger core library.
/// Holds the ledger state, the services that operate on it, and the store it
/// is mirrored to.
///
/// Commands run one at a time to completion (`&mut self`). Each successful
/// command is followed by a full save; a failed save never rolls the command
/// back, it only leaves a warning behind (see [`FinanceLedger::take_save_warning`]).
///
/// When [`FinanceLedger::open`] cannot read an existing store, automatic saves
/// are suspended so the unreadable file is never overwritten with the empty
/// fallback. Only an explicit [`FinanceLedger::save`] writes to it again.
#[must_use]
pub struct FinanceLedger {
    data: LedgerData,
    ledger_service: LedgerService,
    report_service: ReportService,
    conversion_service: ConversionService,
    store: Option<Box<dyn LedgerStore>>,
    /// Tracks whether any mutation has not reached the store yet.
    dirty: bool,
    /// Off after a failed load, until the next explicit `save`.
    autosave: bool,
    save_warning: Option<CoreError>,
}

impl std::fmt::Debug for FinanceLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinanceLedger")
            .field("operations", &self.data.operations.len())
            .field("base_currency", &self.data.base_currency)
            .field("rates", &self.data.exchange_rates.len())
            .field("store", &self.store.as_ref().map(|s| s.describe()))
            .field("dirty", &self.dirty)
            .field("autosave", &self.autosave)
            .finish()
    }
}

impl FinanceLedger {
    /// A brand new empty ledger with default settings and no store attached.
    pub fn create_new() -> Self {
        Self::build(LedgerData::default(), None)
    }

    /// Wrap existing ledger data (imports, tests). The data is repaired if it
    /// breaks the balance invariants.
    pub fn from_data(data: LedgerData) -> Self {
        Self::build(data, None)
    }

    /// Load from `store`, falling back to an empty default ledger when loading fails.
    /// The load error is kept as a save warning for the caller to show, and
    /// automatic saves stay off until [`FinanceLedger::save`] is called.
    pub fn open(store: impl LedgerStore + 'static) -> Self {
        let store: Box<dyn LedgerStore> = Box::new(store);
        match store.load() {
            Ok(data) => {
                tracing::info!(
                    store = %store.describe(),
                    operations = data.operations.len(),
                    "ledger loaded"
                );
                Self::build(data, Some(store))
            }
            Err(e) => {
                tracing::warn!(
                    store = %store.describe(),
                    error = %e,
                    "failed to load ledger, starting empty with autosave suspended"
                );
                let mut ledger = Self::build(LedgerData::default(), Some(store));
                ledger.autosave = false;
                ledger.save_warning = Some(e);
                ledger
            }
        }
    }

    /// Like [`FinanceLedger::open`], but a load failure is returned instead of
    /// being replaced by an empty ledger.
    pub fn try_open(store: impl LedgerStore + 'static) -> Result<Self, CoreError> {
        let data = store.load()?;
        tracing::info!(
            store = %store.describe(),
            operations = data.operations.len(),
            "ledger loaded"
        );
        Ok(Self::build(data, Some(Box::new(store))))
    }

    /// Open the store described by `config` (JSON file, or encrypted when a password is set).
    pub fn open_with_config(config: &LedgerConfig) -> Self {
        let store = config.open_store();
        Self::open(store)
    }

    // ── Commands ────────────────────────────────────────────────────

    /// Record an income or expense. Only income may be `pending`.
    pub fn add_operation(
        &mut self,
        kind: OperationKind,
        name: impl Into<String>,
        amount: Decimal,
        currency: &str,
        comment: impl Into<String>,
        pending: bool,
    ) -> Result<Uuid, CoreError> {
        let currency = Currency::parse(currency)?;
        let operation = Operation::new(kind, name, amount, currency, comment, pending);
        self.add_prepared(operation)
    }

    /// Record an already constructed operation (e.g. with an explicit timestamp).
    pub fn add_prepared(&mut self, operation: Operation) -> Result<Uuid, CoreError> {
        let id = self.ledger_service.add_operation(&mut self.data, operation)?;
        tracing::debug!(%id, "operation added");
        self.persist();
        Ok(id)
    }

    /// Confirm an expected income: it leaves the pending balances and joins
    /// the confirmed ones. Fails with `AlreadyConfirmed` on a second call.
    pub fn confirm_pending(&mut self, id: Uuid) -> Result<(), CoreError> {
        self.ledger_service.confirm_pending(&mut self.data, id)?;
        tracing::debug!(%id, "pending income confirmed");
        self.persist();
        Ok(())
    }

    /// Delete an operation, confirmed or pending. Returns the removed record.
    pub fn delete_operation(&mut self, id: Uuid) -> Result<Operation, CoreError> {
        let removed = self.ledger_service.delete_operation(&mut self.data, id)?;
        tracing::debug!(%id, "operation deleted");
        self.persist();
        Ok(removed)
    }

    /// Remove every operation and both balance maps. Irreversible; asking the
    /// user first is the caller's job. Returns the number of operations removed.
    pub fn clear_all(&mut self) -> usize {
        let removed = self.ledger_service.clear_all(&mut self.data);
        tracing::info!(removed, "ledger cleared");
        self.persist();
        removed
    }

    /// Change the currency totals are reported in.
    pub fn set_base_currency(&mut self, code: &str) -> Result<(), CoreError> {
        self.ledger_service.set_base_currency(&mut self.data, code)?;
        tracing::debug!(base = %self.data.base_currency, "base currency changed");
        self.persist();
        Ok(())
    }

    /// Set "1 unit of `code` = `rate` RUB". Fails with `InvalidRate` for
    /// `rate <= 0`, leaving the previous rate in place.
    pub fn set_exchange_rate(&mut self, code: &str, rate: Decimal) -> Result<(), CoreError> {
        let previous = self
            .ledger_service
            .set_exchange_rate(&mut self.data, code, rate)?;
        tracing::debug!(currency = code, %rate, ?previous, "exchange rate updated");
        self.persist();
        Ok(())
    }

    /// Remember a custom operation name for the entry form.
    /// Returns `false` (and does not save) for blanks and duplicates.
    pub fn add_name_suggestion(&mut self, kind: OperationKind, name: &str) -> bool {
        let added = self.data.names.add(kind, name);
        if added {
            self.persist();
        }
        added
    }

    /// Pull current quotes from `provider` into the rate table and save once.
    ///
    /// With `only_known`, quotes for currencies not already in the table are
    /// ignored. Invalid quotes and the pivot are skipped. Returns how many
    /// rates were applied; a provider failure changes nothing.
    pub async fn refresh_rates(
        &mut self,
        provider: &dyn RateProvider,
        only_known: bool,
    ) -> Result<usize, CoreError> {
        let quotes = provider.fetch_rates().await?;
        let mut applied = 0;

        for (currency, rate) in quotes {
            let unknown = !self.data.exchange_rates.contains(&currency);
            if currency.is_pivot() || (only_known && unknown) {
                continue;
            }
            match self.data.exchange_rates.set_rate(currency.clone(), rate) {
                Ok(_) => applied += 1,
                Err(e) => tracing::warn!(
                    provider = provider.name(),
                    %currency,
                    error = %e,
                    "skipping quote"
                ),
            }
        }

        tracing::info!(provider = provider.name(), applied, "exchange rates refreshed");
        if applied > 0 {
            self.persist();
        }
        Ok(applied)
    }

    /// Write the current state to the store now. Unlike the automatic save
    /// after each command, a failure here is returned. A successful save
    /// resumes automatic saving.
    pub fn save(&mut self) -> Result<(), CoreError> {
        if let Some(store) = &self.store {
            store.save(&self.data)?;
            self.dirty = false;
            self.autosave = true;
            self.save_warning = None;
        }
        Ok(())
    }

    // ── Reports ─────────────────────────────────────────────────────

    /// Confirmed balances converted into the base currency.
    #[must_use]
    pub fn actual_total(&self) -> Decimal {
        self.report_service.actual_total(&self.data)
    }

    /// Pending income converted into the base currency.
    #[must_use]
    pub fn pending_total(&self) -> Decimal {
        self.report_service.pending_total(&self.data)
    }

    /// `actual_total() + pending_total()`.
    #[must_use]
    pub fn grand_total(&self) -> Decimal {
        self.report_service.grand_total(&self.data)
    }

    /// Non-zero balances of one map, sorted by currency code. Each call starts over.
    pub fn per_currency_breakdown(
        &self,
        kind: BalanceKind,
    ) -> impl Iterator<Item = CurrencyBalance> + '_ {
        let balances = match kind {
            BalanceKind::Confirmed => &self.data.confirmed_balances,
            BalanceKind::Pending => &self.data.pending_balances,
        };
        self.report_service.breakdown(balances)
    }

    /// All totals and breakdowns in one snapshot.
    #[must_use]
    pub fn summary(&self) -> LedgerSummary {
        self.report_service.summary(&self.data)
    }

    /// Convert an arbitrary amount with the current rate table.
    pub fn convert(&self, amount: Decimal, from: &str, to: &str) -> Result<Decimal, CoreError> {
        self.conversion_service.convert(
            amount,
            &Currency::new(from),
            &Currency::new(to),
            &self.data.exchange_rates,
        )
    }

    #[must_use]
    pub fn confirmed_balances(&self) -> &BalanceMap {
        &self.data.confirmed_balances
    }

    #[must_use]
    pub fn pending_balances(&self) -> &BalanceMap {
        &self.data.pending_balances
    }

    #[must_use]
    pub fn base_currency(&self) -> &Currency {
        &self.data.base_currency
    }

    #[must_use]
    pub fn exchange_rates(&self) -> &ExchangeRateTable {
        &self.data.exchange_rates
    }

    #[must_use]
    pub fn name_suggestions(&self) -> &NameSuggestions {
        &self.data.names
    }

    /// The full state as it would be saved.
    #[must_use]
    pub fn data(&self) -> &LedgerData {
        &self.data
    }

    /// `true` when the balance maps match a full recomputation from the log.
    #[must_use]
    pub fn balances_consistent(&self) -> bool {
        self.ledger_service.balances_consistent(&self.data)
    }

    // ── Operation listing ───────────────────────────────────────────

    /// All operations in entry order.
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.data.operations
    }

    #[must_use]
    pub fn operation(&self, id: Uuid) -> Option<&Operation> {
        self.data.operations.iter().find(|op| op.id() == id)
    }

    /// Operations matching `filter`, in entry order.
    #[must_use]
    pub fn operations_filtered(&self, filter: OperationFilter) -> Vec<&Operation> {
        self.data
            .operations
            .iter()
            .filter(|op| filter.matches(op))
            .collect()
    }

    /// Id of the operation at `position` within the `filter` listing,
    /// for callers that select rows by index.
    #[must_use]
    pub fn operation_id_at(&self, filter: OperationFilter, position: usize) -> Option<Uuid> {
        self.data
            .operations
            .iter()
            .filter(|op| filter.matches(op))
            .nth(position)
            .map(Operation::id)
    }

    /// Operations in the requested order. Ties keep entry order.
    #[must_use]
    pub fn operations_sorted(&self, order: OperationSortOrder) -> Vec<&Operation> {
        let mut operations: Vec<&Operation> = self.data.operations.iter().collect();
        match order {
            OperationSortOrder::OldestFirst => {}
            OperationSortOrder::NewestFirst => operations.reverse(),
            OperationSortOrder::AmountDesc => {
                operations.sort_by(|a, b| b.amount().cmp(&a.amount()));
            }
            OperationSortOrder::AmountAsc => operations.sort_by(|a, b| a.amount().cmp(&b.amount())),
            OperationSortOrder::Currency => {
                operations.sort_by(|a, b| a.currency().cmp(b.currency()));
            }
        }
        operations
    }

    /// Case-insensitive match against name, comment and currency code.
    #[must_use]
    pub fn search_operations(&self, query: &str) -> Vec<&Operation> {
        let q = query.to_lowercase();
        self.data
            .operations
            .iter()
            .filter(|op| {
                op.name().to_lowercase().contains(&q)
                    || op.comment().to_lowercase().contains(&q)
                    || op.currency().as_str().to_lowercase().contains(&q)
            })
            .collect()
    }

    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.data.operations.len()
    }

    // ── Export ──────────────────────────────────────────────────────

    /// All operations as a JSON array, in document format.
    pub fn export_operations_to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(&self.data.operations)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize operations: {e}")))
    }

    /// All operations as CSV.
    /// Columns: id, kind, name, amount, currency, comment, timestamp, pending
    #[must_use]
    pub fn export_operations_to_csv(&self) -> String {
        let mut csv = String::from("id,kind,name,amount,currency,comment,timestamp,pending\n");
        for op in &self.data.operations {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{}\n",
                op.id(),
                op.kind(),
                csv_field(op.name()),
                op.amount(),
                csv_field(op.currency().as_str()),
                csv_field(op.comment()),
                op.created_at().format(TIMESTAMP_FORMAT),
                op.is_pending(),
            ));
        }
        csv
    }

    /// The whole document as JSON, exactly as a JSON store would write it.
    pub fn to_json(&self) -> Result<String, CoreError> {
        storage::manager::StorageManager::to_json(&self.data)
    }

    // ── Save state ──────────────────────────────────────────────────

    /// Returns `true` if some mutation has not been written to the store.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// The most recent load or save failure, cleared on read.
    pub fn take_save_warning(&mut self) -> Option<CoreError> {
        self.save_warning.take()
    }

    /// `true` while automatic saves are held back after a failed load.
    #[must_use]
    pub fn autosave_suspended(&self) -> bool {
        self.store.is_some() && !self.autosave
    }

    // ── Internal ────────────────────────────────────────────────────

    fn build(mut data: LedgerData, store: Option<Box<dyn LedgerStore>>) -> Self {
        let ledger_service = LedgerService::new();
        let repaired = ledger_service.repair(&mut data);
        if data.base_currency.as_str().is_empty() {
            data.base_currency = Currency::new(PIVOT_CURRENCY);
        }

        Self {
            data,
            ledger_service,
            report_service: ReportService::new(),
            conversion_service: ConversionService::new(),
            store,
            dirty: repaired,
            autosave: true,
            save_warning: None,
        }
    }

    fn persist(&mut self) {
        self.dirty = true;
        let Some(store) = &self.store else {
            return;
        };
        if !self.autosave {
            tracing::debug!(store = %store.describe(), "autosave suspended, change kept in memory");
            return;
        }
        match store.save(&self.data) {
            Ok(()) => {
                self.dirty = false;
                tracing::debug!(store = %store.describe(), "ledger saved");
            }
            Err(e) => {
                tracing::warn!(
                    store = %store.describe(),
                    error = %e,
                    "failed to save ledger, keeping in-memory state"
                );
                self.save_warning = Some(e);
            }
        }
    }
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
