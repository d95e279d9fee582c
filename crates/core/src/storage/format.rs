use super::encryption::{KdfParams, SealedPayload};
use crate::errors::CoreError;

/// Magic bytes at the start of an encrypted ledger file.
pub const MAGIC: &[u8; 4] = b"FNLG";

/// Current container version.
pub const CURRENT_VERSION: u16 = 1;

/// magic(4) + version(2) + kdf params(12) + salt(16) + nonce(12) + ciphertext length(8)
pub const HEADER_SIZE: usize = 54;

/// Lay a sealed payload out as bytes.
///
/// ```text
/// [FNLG: 4B] [version: 2B LE] [memory_cost: 4B LE] [time_cost: 4B LE]
/// [parallelism: 4B LE] [salt: 16B] [nonce: 12B] [ciphertext_len: 8B LE]
/// [ciphertext]
/// ```
#[must_use]
pub fn encode(payload: &SealedPayload) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.ciphertext.len());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&CURRENT_VERSION.to_le_bytes());
    buf.extend_from_slice(&payload.kdf_params.memory_cost.to_le_bytes());
    buf.extend_from_slice(&payload.kdf_params.time_cost.to_le_bytes());
    buf.extend_from_slice(&payload.kdf_params.parallelism.to_le_bytes());
    buf.extend_from_slice(&payload.salt);
    buf.extend_from_slice(&payload.nonce);
    buf.extend_from_slice(&(payload.ciphertext.len() as u64).to_le_bytes());
    buf.extend_from_slice(&payload.ciphertext);
    buf
}

/// Parse bytes produced by [`encode`]. Trailing bytes after the ciphertext are ignored.
pub fn decode(data: &[u8]) -> Result<SealedPayload, CoreError> {
    if data.len() < HEADER_SIZE {
        return Err(CoreError::InvalidFileFormat(format!(
            "{} bytes is too small for an encrypted ledger (header alone is {HEADER_SIZE})",
            data.len()
        )));
    }

    let mut reader = Reader { data, offset: 0 };

    if reader.take::<4>()? != *MAGIC {
        return Err(CoreError::InvalidFileFormat(
            "Missing FNLG magic bytes — not an encrypted ledger".into(),
        ));
    }

    let version = u16::from_le_bytes(reader.take()?);
    if version == 0 || version > CURRENT_VERSION {
        return Err(CoreError::UnsupportedVersion(version));
    }

    let kdf_params = KdfParams {
        memory_cost: u32::from_le_bytes(reader.take()?),
        time_cost: u32::from_le_bytes(reader.take()?),
        parallelism: u32::from_le_bytes(reader.take()?),
    };
    kdf_params.validate()?;

    let salt = reader.take::<16>()?;
    let nonce = reader.take::<12>()?;
    let ciphertext_len = u64::from_le_bytes(reader.take()?);

    let remaining = data.len() - reader.offset;
    let ciphertext_len = usize::try_from(ciphertext_len)
        .ok()
        .filter(|len| *len <= remaining)
        .ok_or_else(|| {
            CoreError::InvalidFileFormat(format!(
                "File truncated: header announces {ciphertext_len} bytes of ciphertext, \
                 {remaining} present"
            ))
        })?;

    Ok(SealedPayload {
        kdf_params,
        salt,
        nonce,
        ciphertext: data[reader.offset..reader.offset + ciphertext_len].to_vec(),
    })
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl Reader<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], CoreError> {
        let bytes: [u8; N] = self
            .data
            .get(self.offset..self.offset + N)
            .and_then(|slice| slice.try_into().ok())
            .ok_or_else(|| {
                CoreError::InvalidFileFormat(format!("Header ends early at byte {}", self.offset))
            })?;
        self.offset += N;
        Ok(bytes)
    }
}
