//! Environment-backed configuration for the vault.
//!
//! Configuration is read once and then treated as immutable. Tests build it
//! through [`VaultConfig::from_lookup`] instead of touching the process
//! environment.

use std::fmt;

use crate::error::{AppError, AppResult};

pub const ENV_ENCRYPTION_KEY: &str = "ENCRYPTION_KEY";
pub const ENV_APP_SECRET: &str = "APP_SECRET";
pub const ENV_ENCRYPTION_ENABLED: &str = "FIELD_ENCRYPTION_ENABLED";
pub const ENV_EXCLUDED_ROUTES: &str = "FIELD_ENCRYPTION_EXCLUDED_ROUTES";

const DEFAULT_EXCLUDED_ROUTES: [&str; 2] = ["/api/auth", "/api/webhooks"];

/// Where the symmetric key comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum KeySource {
    /// `ENCRYPTION_KEY`, used verbatim (or base64-decoded).
    Explicit(String),
    /// `APP_SECRET`, hashed down to a key.
    DerivedFromSecret(String),
}

impl KeySource {
    pub fn describe(&self) -> &'static str {
        match self {
            KeySource::Explicit(_) => "explicit",
            KeySource::DerivedFromSecret(_) => "derived",
        }
    }
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeySource::{}(<redacted>)", self.describe())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiddlewareSettings {
    pub enabled: bool,
    pub excluded_prefixes: Vec<String>,
}

impl Default for MiddlewareSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            excluded_prefixes: DEFAULT_EXCLUDED_ROUTES
                .iter()
                .map(|prefix| prefix.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VaultConfig {
    pub key_source: KeySource,
    pub middleware: MiddlewareSettings,
}

impl VaultConfig {
    pub fn new(key_source: KeySource) -> Self {
        Self {
            key_source,
            middleware: MiddlewareSettings::default(),
        }
    }

    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let key_source = match (read(ENV_ENCRYPTION_KEY), read(ENV_APP_SECRET)) {
            (Some(key), _) => KeySource::Explicit(key),
            (None, Some(secret)) => KeySource::DerivedFromSecret(secret),
            (None, None) => {
                return Err(AppError::configuration(format!(
                    "neither {ENV_ENCRYPTION_KEY} nor {ENV_APP_SECRET} is set"
                )))
            }
        };

        let mut middleware = MiddlewareSettings::default();
        if let Some(raw) = read(ENV_ENCRYPTION_ENABLED) {
            middleware.enabled = parse_flag(&raw).ok_or_else(|| {
                AppError::configuration(format!(
                    "{ENV_ENCRYPTION_ENABLED} has unrecognised value `{raw}`"
                ))
            })?;
        }
        if let Some(raw) = lookup(ENV_EXCLUDED_ROUTES) {
            middleware.excluded_prefixes = parse_prefixes(&raw);
        }

        Ok(Self {
            key_source,
            middleware,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_prefixes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|prefix| !prefix.is_empty())
        .map(|prefix| prefix.to_string())
        .collect()
}
