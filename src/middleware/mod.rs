//! Request/response glue: decrypts sensitive fields of inbound JSON bodies and
//! encrypts them on the way out, so route handlers only ever see plaintext.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, info_span, warn};
use uuid::Uuid;

use crate::config::MiddlewareSettings;
use crate::error::AppResult;
use crate::models::decryption::Decrypted;
use crate::services::sensitive_codec::SensitiveDataCodec;
use crate::utils::redact::redact_sensitive_data;

const JSON_CONTENT_TYPE: &str = "application/json";

pub struct SecureBodyMiddleware {
    codec: Arc<SensitiveDataCodec>,
    settings: MiddlewareSettings,
}

impl SecureBodyMiddleware {
    pub fn new(codec: Arc<SensitiveDataCodec>, settings: MiddlewareSettings) -> Self {
        Self { codec, settings }
    }

    pub fn settings(&self) -> &MiddlewareSettings {
        &self.settings
    }

    /// True when bodies on this route are transformed.
    pub fn applies_to(&self, path: &str, content_type: Option<&str>) -> bool {
        if !self.settings.enabled {
            return false;
        }
        let is_json = content_type
            .and_then(|value| value.split(';').next())
            .map(|mime| mime.trim().eq_ignore_ascii_case(JSON_CONTENT_TYPE))
            .unwrap_or(false);
        if !is_json {
            return false;
        }
        !self
            .settings
            .excluded_prefixes
            .iter()
            .any(|prefix| route_has_prefix(path, prefix))
    }

    /// Returns `None` when the route is not handled or the body is empty; the
    /// caller then uses the raw body.
    pub fn decrypt_request(
        &self,
        path: &str,
        content_type: Option<&str>,
        body: &[u8],
    ) -> AppResult<Option<Decrypted<JsonValue>>> {
        if !self.applies_to(path, content_type) || body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let request_id = Uuid::new_v4();
        let span = info_span!(target: "vault::middleware", "decrypt_request", %request_id, path);
        let _entered = span.enter();

        let parsed: JsonValue = serde_json::from_slice(body)?;
        let decrypted = self.codec.decrypt_tree_with_report(&parsed);

        if decrypted.report.has_failures() {
            warn!(
                target: "vault::middleware",
                fields = ?decrypted.report.passed_through_paths(),
                "request fields passed through undecrypted"
            );
        }
        debug!(
            target: "vault::middleware",
            body = %redact_sensitive_data(&decrypted.value),
            "request body decrypted"
        );

        Ok(Some(decrypted))
    }

    /// Serialised response body, encrypted when the route is handled.
    pub fn encrypt_response(
        &self,
        path: &str,
        content_type: Option<&str>,
        body: &JsonValue,
    ) -> AppResult<Vec<u8>> {
        if !self.applies_to(path, content_type) {
            return Ok(serde_json::to_vec(body)?);
        }

        let request_id = Uuid::new_v4();
        let span = info_span!(target: "vault::middleware", "encrypt_response", %request_id, path);
        let _entered = span.enter();

        let encrypted = self.codec.encrypt_tree(body)?;
        debug!(
            target: "vault::middleware",
            body = %redact_sensitive_data(body),
            "response body encrypted"
        );
        Ok(serde_json::to_vec(&encrypted)?)
    }
}

/// Segment-aware prefix match: `/api/auth` covers `/api/auth/session` but not
/// `/api/authors`.
fn route_has_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}
