use std::fmt;

use thiserror::Error;
use tracing::{debug, error, warn};

pub type AppResult<T> = Result<T, AppError>;

/// Coarse classification used by callers that only need to know how bad a
/// failure is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Missing or malformed key material. Not recoverable per call.
    Fatal,
    /// A single value could not be processed.
    Recoverable,
}

impl ErrorSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorSeverity::Fatal => "FATAL",
            ErrorSeverity::Recoverable => "RECOVERABLE",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("encryption failed: {message}")]
    Encryption { message: String },

    #[error("decryption failed: {message}")]
    Decryption { message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn configuration(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "vault::config", %message, "configuration error");
        AppError::Configuration { message }
    }

    pub fn encryption(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "vault::crypto", %message, "encryption error");
        AppError::Encryption { message }
    }

    /// Decryption failures are routinely tolerated by the tree and payment
    /// walkers, so they are logged at debug level only.
    pub fn decryption(message: impl Into<String>) -> Self {
        let message = message.into();
        debug!(target: "vault::crypto", %message, "decryption error");
        AppError::Decryption { message }
    }

    pub fn other(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "vault::other", %message, "other error");
        AppError::Other(message)
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::Configuration { .. } => ErrorSeverity::Fatal,
            _ => ErrorSeverity::Recoverable,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == ErrorSeverity::Fatal
    }

    pub fn is_decryption(&self) -> bool {
        matches!(self, AppError::Decryption { .. })
    }
}
