use std::fmt;

use aes::Aes256;
use base64::{engine::general_purpose::STANDARD as Base64, Engine as _};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use once_cell::sync::OnceCell;
use rand::rngs::OsRng;
use rand::RngCore;
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

use crate::config::{KeySource, VaultConfig};
use crate::error::{AppError, AppResult};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;
const BLOCK_LEN: usize = 16;

static GLOBAL_KEY: OnceCell<EncryptionKey> = OnceCell::new();

/// AES-256 key shared by every encrypt/decrypt call in the process.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    pub fn from_bytes(bytes: &[u8]) -> AppResult<Self> {
        if bytes.len() != KEY_LEN {
            return Err(AppError::configuration(format!(
                "encryption key must be {KEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// Accepts 32 raw bytes, or standard base64 of 32 bytes.
    pub fn from_explicit(value: &str) -> AppResult<Self> {
        if value.len() == KEY_LEN {
            return Self::from_bytes(value.as_bytes());
        }
        match Base64.decode(value.trim().as_bytes()) {
            Ok(decoded) if decoded.len() == KEY_LEN => Self::from_bytes(&decoded),
            _ => Err(AppError::configuration(format!(
                "ENCRYPTION_KEY must be {KEY_LEN} bytes or base64 of {KEY_LEN} bytes"
            ))),
        }
    }

    pub fn derive_from_secret(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&digest[..KEY_LEN]);
        Self(key)
    }

    pub fn resolve(source: &KeySource) -> AppResult<Self> {
        match source {
            KeySource::Explicit(value) => Self::from_explicit(value),
            KeySource::DerivedFromSecret(secret) => {
                if secret.is_empty() {
                    return Err(AppError::configuration("APP_SECRET is empty"));
                }
                Ok(Self::derive_from_secret(secret))
            }
        }
    }

    /// Process-wide key, loaded from the environment on first use.
    pub fn global() -> AppResult<&'static EncryptionKey> {
        GLOBAL_KEY.get_or_try_init(|| {
            let config = VaultConfig::from_env()?;
            let key = Self::resolve(&config.key_source)?;
            tracing::info!(
                target: "vault::config",
                source = config.key_source.describe(),
                "encryption key loaded"
            );
            Ok(key)
        })
    }

    /// Installs the process-wide key. Fails if one is already loaded.
    pub fn install_global(key: EncryptionKey) -> AppResult<()> {
        GLOBAL_KEY
            .set(key)
            .map_err(|_| AppError::configuration("encryption key already initialised"))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

/// Encrypts UTF-8 text into a `base64(iv || ciphertext)` envelope.
pub fn encrypt_text(key: &EncryptionKey, plaintext: &str) -> AppResult<String> {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let cipher = Aes256CbcEnc::new_from_slices(key.as_bytes(), &iv)
        .map_err(|_| AppError::encryption("failed to initialise cipher"))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    let mut payload = Vec::with_capacity(IV_LEN + ciphertext.len());
    payload.extend_from_slice(&iv);
    payload.extend_from_slice(&ciphertext);

    Ok(Base64.encode(payload))
}

/// Strings are encrypted as-is; anything else is serialized to JSON first.
pub fn encrypt_value(key: &EncryptionKey, value: &JsonValue) -> AppResult<String> {
    match value {
        JsonValue::String(text) => encrypt_text(key, text),
        other => {
            let serialized = serde_json::to_string(other)
                .map_err(|err| AppError::encryption(format!("cannot serialize value: {err}")))?;
            encrypt_text(key, &serialized)
        }
    }
}

/// Decrypts an envelope back to its raw text.
pub fn decrypt_text(key: &EncryptionKey, envelope: &str) -> AppResult<String> {
    let decoded = Base64
        .decode(envelope.trim().as_bytes())
        .map_err(|_| AppError::decryption("envelope is not valid base64"))?;

    if decoded.len() < IV_LEN + BLOCK_LEN {
        return Err(AppError::decryption("envelope too short"));
    }

    let (iv, ciphertext) = decoded.split_at(IV_LEN);
    if ciphertext.len() % BLOCK_LEN != 0 {
        return Err(AppError::decryption("ciphertext is not block aligned"));
    }

    let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), iv)
        .map_err(|_| AppError::decryption("failed to initialise cipher"))?;
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| AppError::decryption("bad padding or wrong key"))?;

    String::from_utf8(plaintext).map_err(|_| AppError::decryption("plaintext is not UTF-8"))
}

/// Decrypts an envelope, returning parsed JSON when the plaintext is JSON
/// and the raw string otherwise.
pub fn decrypt_value(key: &EncryptionKey, envelope: &str) -> AppResult<JsonValue> {
    let text = decrypt_text(key, envelope)?;
    Ok(serde_json::from_str(&text).unwrap_or(JsonValue::String(text)))
}
