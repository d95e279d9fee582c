use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Unified error type for the entire finance-ledger-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Ledger commands ─────────────────────────────────────────────
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Only income can be pending — expenses are always confirmed")]
    InvalidPendingFlag,

    #[error("Invalid exchange rate for {currency}: {rate} (must be greater than zero)")]
    InvalidRate { currency: String, rate: Decimal },

    #[error("Rate of the pivot currency {0} is fixed at 1")]
    PivotRateFixed(String),

    #[error("Invalid currency code: '{0}'")]
    InvalidCurrency(String),

    #[error("Operation not found: {0}")]
    NotFound(Uuid),

    #[error("Operation already confirmed: {0}")]
    AlreadyConfirmed(Uuid),

    #[error("No exchange rate for currency: {0}")]
    UnknownCurrency(String),

    // ── Storage / File ──────────────────────────────────────────────
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Unsupported file version: {0}")]
    UnsupportedVersion(u16),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed — wrong password or corrupted file")]
    Decryption,

    // ── Rate providers ──────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api { provider: String, message: String },

    #[error("Network error: {0}")]
    Network(String),
}

impl CoreError {
    /// `true` for every failure that comes from loading or saving the ledger document.
    #[must_use]
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            CoreError::PersistenceFailure(_)
                | CoreError::Serialization(_)
                | CoreError::Deserialization(_)
                | CoreError::InvalidFileFormat(_)
                | CoreError::UnsupportedVersion(_)
                | CoreError::Encryption(_)
                | CoreError::Decryption
        )
    }

    /// `true` for errors raised by command validation, before any state changed.
    #[must_use]
    pub fn is_rejected_command(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidAmount(_)
                | CoreError::InvalidPendingFlag
                | CoreError::InvalidRate { .. }
                | CoreError::PivotRateFixed(_)
                | CoreError::InvalidCurrency(_)
                | CoreError::NotFound(_)
                | CoreError::AlreadyConfirmed(_)
        )
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::PersistenceFailure(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Feed URLs may carry query parameters; keep them out of error text.
        let msg = e.to_string();
        let sanitized = match msg.find('?') {
            Some(idx) => format!("{}?<query redacted>", &msg[..idx]),
            None => msg,
        };
        CoreError::Network(sanitized)
    }
}

impl From<aes_gcm::Error> for CoreError {
    fn from(_: aes_gcm::Error) -> Self {
        CoreError::Decryption
    }
}
