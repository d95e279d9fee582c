use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::errors::CoreError;
use crate::models::ledger::LedgerData;

use super::encryption::{self, KdfParams};
use super::format;
use super::traits::LedgerStore;

const TMP_SUFFIX: &str = "tmp";

/// Codec between `LedgerData` and its on-disk forms.
pub struct StorageManager;

impl StorageManager {
    /// Pretty-printed JSON document.
    pub fn to_json(data: &LedgerData) -> Result<String, CoreError> {
        serde_json::to_string_pretty(data)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize ledger: {e}")))
    }

    /// Parse a JSON document. Blank input is a fresh install; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<LedgerData, CoreError> {
        if json.trim().is_empty() {
            return Ok(LedgerData::default());
        }
        serde_json::from_str(json).map_err(|e| {
            CoreError::Deserialization(format!("Failed to parse ledger document: {e}"))
        })
    }

    /// Flow: LedgerData → JSON → AES-256-GCM(Argon2id(password)) → FNLG container bytes
    pub fn seal_to_bytes(
        data: &LedgerData,
        password: &str,
        kdf_params: KdfParams,
    ) -> Result<Vec<u8>, CoreError> {
        let json = Self::to_json(data)?;
        let payload = encryption::seal(json.as_bytes(), password, kdf_params)?;
        Ok(format::encode(&payload))
    }

    /// Flow: FNLG bytes → header → Argon2id(password, salt) → AES-256-GCM decrypt
    /// → JSON → LedgerData
    pub fn open_from_bytes(bytes: &[u8], password: &str) -> Result<LedgerData, CoreError> {
        let payload = format::decode(bytes)?;
        let plaintext = encryption::open(&payload, password)?;
        let json = String::from_utf8(plaintext).map_err(|e| {
            CoreError::Deserialization(format!("Decrypted ledger is not UTF-8: {e}"))
        })?;
        Self::from_json(&json)
    }

    /// Replace `path` with `bytes` via a sibling temp file and a rename,
    /// so a crash mid-write never leaves a half-written ledger behind.
    pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = tmp_path(path);
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

// ── Stores ──────────────────────────────────────────────────────────

/// Plain JSON file, the format the ledger has always used.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> Result<LedgerData, CoreError> {
        if !self.path.exists() {
            return Ok(LedgerData::default());
        }
        let json = fs::read_to_string(&self.path)?;
        StorageManager::from_json(&json)
    }

    fn save(&self, data: &LedgerData) -> Result<(), CoreError> {
        let json = StorageManager::to_json(data)?;
        StorageManager::write_atomic(&self.path, json.as_bytes())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Password-protected file: the JSON document sealed in an FNLG container.
pub struct EncryptedFileStore {
    path: PathBuf,
    password: String,
    kdf_params: KdfParams,
}

impl EncryptedFileStore {
    pub fn new(path: impl Into<PathBuf>, password: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            password: password.into(),
            kdf_params: KdfParams::default(),
        }
    }

    /// Override the key-derivation cost used for future saves.
    #[must_use]
    pub fn with_kdf_params(mut self, kdf_params: KdfParams) -> Self {
        self.kdf_params = kdf_params;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for EncryptedFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedFileStore")
            .field("path", &self.path)
            .field("kdf_params", &self.kdf_params)
            .finish_non_exhaustive()
    }
}

impl LedgerStore for EncryptedFileStore {
    fn load(&self) -> Result<LedgerData, CoreError> {
        if !self.path.exists() {
            return Ok(LedgerData::default());
        }
        let bytes = fs::read(&self.path)?;
        StorageManager::open_from_bytes(&bytes, &self.password)
    }

    fn save(&self, data: &LedgerData) -> Result<(), CoreError> {
        let bytes = StorageManager::seal_to_bytes(data, &self.password, self.kdf_params)?;
        StorageManager::write_atomic(&self.path, &bytes)
    }

    fn describe(&self) -> String {
        format!("{} (encrypted)", self.path.display())
    }
}

/// In-process store holding the serialized document; for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<Option<String>>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing JSON document.
    pub fn with_document(json: impl Into<String>) -> Self {
        Self {
            document: Mutex::new(Some(json.into())),
            ..Self::default()
        }
    }

    /// Make every following `save` fail with `PersistenceFailure`.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// The last successfully saved document, if any.
    #[must_use]
    pub fn document(&self) -> Option<String> {
        self.document.lock().ok().and_then(|doc| doc.clone())
    }

    /// Number of successful saves so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<LedgerData, CoreError> {
        match self.document() {
            Some(json) => StorageManager::from_json(&json),
            None => Ok(LedgerData::default()),
        }
    }

    fn save(&self, data: &LedgerData) -> Result<(), CoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(CoreError::PersistenceFailure("memory store is refusing writes".into()));
        }
        let json = StorageManager::to_json(data)?;
        let mut document = self
            .document
            .lock()
            .map_err(|_| CoreError::PersistenceFailure("memory store lock poisoned".into()))?;
        *document = Some(json);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
