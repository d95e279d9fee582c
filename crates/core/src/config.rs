use std::path::PathBuf;

use crate::storage::manager::{EncryptedFileStore, JsonFileStore};
use crate::storage::traits::LedgerStore;

/// Default ledger document, relative to the working directory.
pub const DEFAULT_DATA_FILE: &str = "finance_data.json";

/// Environment variable overriding the ledger file location.
pub const ENV_DATA_FILE: &str = "FINANCE_LEDGER_FILE";

/// Environment variable holding the password; when set, the file is encrypted.
pub const ENV_PASSWORD: &str = "FINANCE_LEDGER_PASSWORD";

/// Process-level configuration: where the ledger lives and how it is stored.
///
/// User-editable settings (base currency, rates, name lists) are not here;
/// they travel inside the ledger document itself.
#[derive(Clone)]
pub struct LedgerConfig {
    pub data_file: PathBuf,
    pub password: Option<String>,
}

impl LedgerConfig {
    pub fn new(data_file: impl Into<PathBuf>) -> Self {
        Self {
            data_file: data_file.into(),
            password: None,
        }
    }

    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Defaults overridden by `FINANCE_LEDGER_FILE` / `FINANCE_LEDGER_PASSWORD`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`LedgerConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_file = lookup(ENV_DATA_FILE)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE));
        let password = lookup(ENV_PASSWORD).filter(|value| !value.is_empty());
        Self { data_file, password }
    }

    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        self.password.is_some()
    }

    /// Build the store this configuration describes.
    #[must_use]
    pub fn open_store(&self) -> Box<dyn LedgerStore> {
        match &self.password {
            Some(password) => Box::new(EncryptedFileStore::new(
                self.data_file.clone(),
                password.clone(),
            )),
            None => Box::new(JsonFileStore::new(self.data_file.clone())),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_FILE)
    }
}

impl std::fmt::Debug for LedgerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerConfig")
            .field("data_file", &self.data_file)
            .field("encrypted", &self.is_encrypted())
            .finish()
    }
}
