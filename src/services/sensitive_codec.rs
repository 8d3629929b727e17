use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::models::decryption::{DecryptReport, Decrypted, FieldOutcome};
use crate::utils::crypto::{self, EncryptionKey};
use crate::utils::redact;

/// Encrypts and decrypts the sensitive string leaves of arbitrary JSON.
///
/// A key is sensitive when its lower-cased name contains one of
/// [`redact::SENSITIVE_KEYWORDS`]. Only string values under sensitive keys
/// are touched; every other value keeps its shape and content. The walkers
/// never mutate their input.
#[derive(Debug, Clone)]
pub struct SensitiveDataCodec {
    key: EncryptionKey,
}

impl SensitiveDataCodec {
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }

    /// Codec over the process-wide key.
    pub fn from_global() -> AppResult<Self> {
        Ok(Self::new(EncryptionKey::global()?.clone()))
    }

    pub fn key(&self) -> &EncryptionKey {
        &self.key
    }

    pub fn is_sensitive_key(key: &str) -> bool {
        redact::is_sensitive_key(key)
    }

    pub fn encrypt_value(&self, value: &JsonValue) -> AppResult<String> {
        crypto::encrypt_value(&self.key, value)
    }

    pub fn decrypt_value(&self, envelope: &str) -> AppResult<JsonValue> {
        crypto::decrypt_value(&self.key, envelope)
    }

    pub fn encrypt_tree(&self, value: &JsonValue) -> AppResult<JsonValue> {
        let mut encrypted_fields = 0usize;
        let result = self.encrypt_node(value, &mut encrypted_fields)?;
        debug!(target: "vault::codec", encrypted_fields, "payload encrypted");
        Ok(result)
    }

    /// Undecryptable fields keep their incoming value; see
    /// [`Self::decrypt_tree_with_report`] to find out which ones.
    pub fn decrypt_tree(&self, value: &JsonValue) -> JsonValue {
        self.decrypt_tree_with_report(value).value
    }

    pub fn decrypt_tree_with_report(&self, value: &JsonValue) -> Decrypted<JsonValue> {
        let mut report = DecryptReport::default();
        let mut path = String::new();
        let value = self.decrypt_node(value, &mut path, &mut report);
        debug!(
            target: "vault::codec",
            decrypted = report.decrypted_paths().len(),
            passed_through = report.passed_through_paths().len(),
            "payload decrypted"
        );
        Decrypted { value, report }
    }

    fn encrypt_node(&self, value: &JsonValue, count: &mut usize) -> AppResult<JsonValue> {
        match value {
            JsonValue::Object(map) => {
                let mut out = JsonMap::with_capacity(map.len());
                for (key, val) in map {
                    let next = match val {
                        JsonValue::String(text) if Self::is_sensitive_key(key) => {
                            *count += 1;
                            JsonValue::String(crypto::encrypt_text(&self.key, text)?)
                        }
                        other => self.encrypt_node(other, count)?,
                    };
                    out.insert(key.clone(), next);
                }
                Ok(JsonValue::Object(out))
            }
            JsonValue::Array(items) => items
                .iter()
                .map(|item| self.encrypt_node(item, count))
                .collect::<AppResult<Vec<_>>>()
                .map(JsonValue::Array),
            other => Ok(other.clone()),
        }
    }

    fn decrypt_node(
        &self,
        value: &JsonValue,
        path: &mut String,
        report: &mut DecryptReport,
    ) -> JsonValue {
        match value {
            JsonValue::Object(map) => {
                let mut out = JsonMap::with_capacity(map.len());
                for (key, val) in map {
                    let parent_len = path.len();
                    if !path.is_empty() {
                        path.push('.');
                    }
                    path.push_str(key);

                    let next = match val {
                        JsonValue::String(text) if Self::is_sensitive_key(key) => {
                            self.decrypt_field(text, path, report)
                        }
                        other => self.decrypt_node(other, path, report),
                    };
                    out.insert(key.clone(), next);
                    path.truncate(parent_len);
                }
                JsonValue::Object(out)
            }
            JsonValue::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let parent_len = path.len();
                    path.push_str(&format!("[{index}]"));
                    out.push(self.decrypt_node(item, path, report));
                    path.truncate(parent_len);
                }
                JsonValue::Array(out)
            }
            other => other.clone(),
        }
    }

    fn decrypt_field(&self, text: &str, path: &str, report: &mut DecryptReport) -> JsonValue {
        match crypto::decrypt_text(&self.key, text) {
            Ok(plain) => {
                report.record(FieldOutcome::decrypted(path));
                JsonValue::String(plain)
            }
            Err(err) => {
                warn!(target: "vault::codec", field = %path, error = %err, "field left as-is");
                report.record(FieldOutcome::passed_through(path, err.to_string()));
                JsonValue::String(text.to_string())
            }
        }
    }
}
