// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Gateway configuration
//!
//! Built once at startup from the environment (optionally seeded from a
//! `.env` file) and shared read-only afterwards.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `PRIVATE_KEY` | required | RSA private key PEM |
//! | `PASSPHRASE` | `""` | passphrase for an encrypted PKCS#8 key |
//! | `APP_SECRET` | unset | HMAC secret for `x-hub-signature-256` |
//! | `ALLOW_UNSIGNED_REQUESTS` | `false` | start without `APP_SECRET` |
//! | `BIND_ADDRESS` | `0.0.0.0` | listen address |
//! | `PORT` | `3000` | listen port |
//! | `FLOW_SCREENS_PATH` | unset | JSON screen registry |

use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::flow::{ScreenRegistry, ScreenRegistryError};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Private key is empty. Please check your env variable \"PRIVATE_KEY\".")]
    MissingPrivateKey,
    #[error(
        "APP_SECRET is not set. Set APP_SECRET, or set ALLOW_UNSIGNED_REQUESTS=true to \
         accept unsigned requests (development only)"
    )]
    MissingAppSecret,
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
    #[error(transparent)]
    Screens(#[from] ScreenRegistryError),
}

/// Key material for the envelope protocol
///
/// Never printed: `Debug` shows only which values are present.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    pub private_key_pem: String,
    pub passphrase: String,
    pub app_secret: Option<String>,
}

impl KeyMaterial {
    pub fn new(
        private_key_pem: impl Into<String>,
        passphrase: impl Into<String>,
        app_secret: Option<String>,
    ) -> Self {
        Self {
            private_key_pem: normalize_pem(&private_key_pem.into()),
            passphrase: passphrase.into(),
            app_secret,
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("private_key_pem", &"[REDACTED]")
            .field("passphrase_set", &!self.passphrase.is_empty())
            .field("app_secret_set", &self.app_secret.is_some())
            .finish()
    }
}

/// Process-wide gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub keys: KeyMaterial,
    /// Explicit opt-in to run without a signature secret
    pub allow_unsigned_requests: bool,
    pub bind_address: String,
    pub port: u16,
    pub screens_path: Option<PathBuf>,
}

impl GatewayConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let private_key_pem = non_empty("PRIVATE_KEY").ok_or(ConfigError::MissingPrivateKey)?;

        let port = match non_empty("PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidValue {
                    name: "PORT".to_string(),
                    reason: e.to_string(),
                })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            keys: KeyMaterial::new(
                private_key_pem,
                lookup("PASSPHRASE").unwrap_or_default(),
                non_empty("APP_SECRET"),
            ),
            allow_unsigned_requests: non_empty("ALLOW_UNSIGNED_REQUESTS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            bind_address: non_empty("BIND_ADDRESS")
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port,
            screens_path: non_empty("FLOW_SCREENS_PATH").map(PathBuf::from),
        })
    }

    /// Validate the configuration for serving requests
    ///
    /// Refuses to run without a signature secret unless unsigned requests
    /// were explicitly allowed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_keys()?;
        if self.keys.app_secret.is_none() && !self.allow_unsigned_requests {
            return Err(ConfigError::MissingAppSecret);
        }
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "BIND_ADDRESS".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Checks for commands that only read the private key
    pub fn validate_keys(&self) -> Result<(), ConfigError> {
        if self.keys.private_key_pem.trim().is_empty() {
            return Err(ConfigError::MissingPrivateKey);
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Screen registry from `screens_path`, or the built-in default
    pub fn load_screens(&self) -> Result<ScreenRegistry, ConfigError> {
        match &self.screens_path {
            Some(path) => Ok(ScreenRegistry::from_file(path)?),
            None => Ok(ScreenRegistry::default()),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

/// Turn literal `\n` sequences (single-line env values) into newlines
pub fn normalize_pem(pem: &str) -> String {
    pem.replace("\\n", "\n").trim().to_string()
}
