use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::errors::CoreError;

/// Argon2id cost parameters. Written into every sealed file so that
/// files keep opening after the defaults change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub memory_cost: u32,
    /// Iterations
    pub time_cost: u32,
    /// Lanes
    pub parallelism: u32,
}

impl KdfParams {
    /// Reject parameters a crafted file could use to exhaust memory or CPU.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(8..=1_048_576).contains(&self.memory_cost) {
            return Err(CoreError::InvalidFileFormat(format!(
                "KDF memory_cost out of range: {} KiB (expected 8..=1048576)",
                self.memory_cost
            )));
        }
        if !(1..=20).contains(&self.time_cost) {
            return Err(CoreError::InvalidFileFormat(format!(
                "KDF time_cost out of range: {} (expected 1..=20)",
                self.time_cost
            )));
        }
        if !(1..=16).contains(&self.parallelism) {
            return Err(CoreError::InvalidFileFormat(format!(
                "KDF parallelism out of range: {} (expected 1..=16)",
                self.parallelism
            )));
        }
        Ok(())
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_cost: 19_456, // 19 MiB
            time_cost: 2,
            parallelism: 1,
        }
    }
}

/// Everything needed to reopen an encrypted ledger, except the password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    pub kdf_params: KdfParams,
    pub salt: [u8; 16],
    pub nonce: [u8; 12],
    /// AES-256-GCM output, authentication tag included
    pub ciphertext: Vec<u8>,
}

/// Encrypt `plaintext` under a key derived from `password` with a fresh salt and nonce.
pub fn seal(
    plaintext: &[u8],
    password: &str,
    kdf_params: KdfParams,
) -> Result<SealedPayload, CoreError> {
    kdf_params.validate()?;
    let salt: [u8; 16] = random_bytes()?;
    let nonce: [u8; 12] = random_bytes()?;
    let cipher = cipher_for(password, &salt, &kdf_params)?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| CoreError::Encryption(format!("AES-GCM encryption failed: {e}")))?;

    Ok(SealedPayload {
        kdf_params,
        salt,
        nonce,
        ciphertext,
    })
}

/// Decrypt a payload. A wrong password and a tampered file both end in `Decryption`.
pub fn open(payload: &SealedPayload, password: &str) -> Result<Vec<u8>, CoreError> {
    payload.kdf_params.validate()?;
    let cipher = cipher_for(password, &payload.salt, &payload.kdf_params)?;
    Ok(cipher.decrypt(Nonce::from_slice(&payload.nonce), payload.ciphertext.as_slice())?)
}

fn cipher_for(
    password: &str,
    salt: &[u8; 16],
    kdf_params: &KdfParams,
) -> Result<Aes256Gcm, CoreError> {
    let params = Params::new(
        kdf_params.memory_cost,
        kdf_params.time_cost,
        kdf_params.parallelism,
        Some(32),
    )
    .map_err(|e| CoreError::Encryption(format!("Invalid Argon2 params: {e}")))?;

    let mut key = [0u8; 32];
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|e| CoreError::Encryption(format!("Key derivation failed: {e}")))?;

    Aes256Gcm::new_from_slice(&key)
        .map_err(|e| CoreError::Encryption(format!("Failed to create cipher: {e}")))
}

fn random_bytes<const N: usize>() -> Result<[u8; N], CoreError> {
    let mut buf = [0u8; N];
    getrandom::getrandom(&mut buf)
        .map_err(|e| CoreError::Encryption(format!("Failed to gather randomness: {e}")))?;
    Ok(buf)
}
