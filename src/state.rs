use std::sync::Arc;

use tracing::info;

use crate::config::VaultConfig;
use crate::error::AppResult;
use crate::middleware::SecureBodyMiddleware;
use crate::services::payment_redactor::PaymentRedactor;
use crate::services::sensitive_codec::SensitiveDataCodec;
use crate::utils::crypto::EncryptionKey;

/// Shared handles built once at startup and cloned into request handlers.
#[derive(Clone)]
pub struct AppState {
    codec: Arc<SensitiveDataCodec>,
    payment_redactor: Arc<PaymentRedactor>,
    middleware: Arc<SecureBodyMiddleware>,
}

impl AppState {
    /// Fails with a fatal configuration error when the key cannot be resolved.
    pub fn new(config: VaultConfig) -> AppResult<Self> {
        let key = EncryptionKey::resolve(&config.key_source)?;
        info!(
            target: "vault::config",
            source = config.key_source.describe(),
            middleware_enabled = config.middleware.enabled,
            "vault state initialised"
        );
        Ok(Self::with_key(key, config))
    }

    pub fn from_env() -> AppResult<Self> {
        Self::new(VaultConfig::from_env()?)
    }

    pub fn with_key(key: EncryptionKey, config: VaultConfig) -> Self {
        let codec = Arc::new(SensitiveDataCodec::new(key));
        let payment_redactor = Arc::new(PaymentRedactor::new(Arc::clone(&codec)));
        let middleware = Arc::new(SecureBodyMiddleware::new(
            Arc::clone(&codec),
            config.middleware,
        ));
        Self {
            codec,
            payment_redactor,
            middleware,
        }
    }

    pub fn codec(&self) -> Arc<SensitiveDataCodec> {
        Arc::clone(&self.codec)
    }

    pub fn payments(&self) -> Arc<PaymentRedactor> {
        Arc::clone(&self.payment_redactor)
    }

    pub fn middleware(&self) -> Arc<SecureBodyMiddleware> {
        Arc::clone(&self.middleware)
    }
}
