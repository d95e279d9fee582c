use crate::errors::CoreError;
use crate::models::ledger::LedgerData;

/// Where the ledger document lives between sessions.
///
/// `save` replaces the whole document; `load` of a store that has never been
/// written returns `LedgerData::default()` rather than an error.
pub trait LedgerStore: Send + Sync {
    fn load(&self) -> Result<LedgerData, CoreError>;

    fn save(&self, data: &LedgerData) -> Result<(), CoreError>;

    /// Short human-readable location, used in log lines.
    fn describe(&self) -> String;
}

/// Lets a caller keep a handle on the store it hands to the ledger.
impl<T: LedgerStore + ?Sized> LedgerStore for std::sync::Arc<T> {
    fn load(&self) -> Result<LedgerData, CoreError> {
        (**self).load()
    }

    fn save(&self, data: &LedgerData) -> Result<(), CoreError> {
        (**self).save(data)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<T: LedgerStore + ?Sized> LedgerStore for Box<T> {
    fn load(&self) -> Result<LedgerData, CoreError> {
        (**self).load()
    }

    fn save(&self, data: &LedgerData) -> Result<(), CoreError> {
        (**self).save(data)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
