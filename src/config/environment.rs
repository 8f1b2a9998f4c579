// ABOUTME: Environment configuration for the sync engine and its WHOOP integration
// ABOUTME: Validates the token encryption key, OAuth client settings, timeouts, and concurrency
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration
//!
//! Everything is read once at startup. A missing or malformed encryption key
//! is fatal here so that no request path ever sees a key problem.

use base64::{engine::general_purpose, Engine as _};
use healthmetrics_core::errors::config::ENCRYPTION_KEY_VAR;
use healthmetrics_core::errors::ConfigError;
use healthmetrics_providers::whoop::constants::{DEFAULT_API_BASE_URL, DEFAULT_TOKEN_URL};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use zeroize::Zeroizing;

/// Required AES-256 key length in bytes
pub const ENCRYPTION_KEY_LEN: usize = 32;

const DEFAULT_DATABASE_URL: &str = "sqlite:./data/healthmetrics.db";
const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TOKEN_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RUN_DEADLINE_SECS: u64 = 300;
const DEFAULT_SYNC_CONCURRENCY: usize = 4;

/// Decoded 32-byte token encryption key, wiped on drop
#[derive(Clone)]
pub struct EncryptionKey(Zeroizing<Vec<u8>>);

impl EncryptionKey {
    /// Decode and validate a base64 key
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when the value is not base64 or does not
    /// decode to exactly 32 bytes
    pub fn from_base64(encoded: &str) -> Result<Self, ConfigError> {
        let bytes = Zeroizing::new(
            general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|e| ConfigError::invalid(ENCRYPTION_KEY_VAR, format!("not base64: {e}")))?,
        );

        if bytes.len() != ENCRYPTION_KEY_LEN {
            return Err(ConfigError::invalid(
                ENCRYPTION_KEY_VAR,
                format!(
                    "must decode to {ENCRYPTION_KEY_LEN} bytes, got {}",
                    bytes.len()
                ),
            ));
        }

        Ok(Self(bytes))
    }

    /// Raw key bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey([REDACTED])")
    }
}

/// WHOOP OAuth and API settings
#[derive(Clone)]
pub struct WhoopConfig {
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// The only redirect URI accepted by credential exchange
    pub redirect_url: String,
    /// OAuth token endpoint
    pub token_url: String,
    /// Developer API base URL
    pub api_base_url: String,
    /// Per-request deadline for data fetches
    pub api_timeout: Duration,
    /// Per-request deadline for code and refresh exchange
    pub token_timeout: Duration,
}

impl fmt::Debug for WhoopConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhoopConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_url", &self.redirect_url)
            .field("token_url", &self.token_url)
            .field("api_base_url", &self.api_base_url)
            .field("api_timeout", &self.api_timeout)
            .field("token_timeout", &self.token_timeout)
            .finish()
    }
}

/// Complete sync engine configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Credential vault key
    pub encryption_key: EncryptionKey,
    /// Provider settings
    pub whoop: WhoopConfig,
    /// sqlx connection string
    pub database_url: String,
    /// Overall deadline for one sync run
    pub run_deadline: Duration,
    /// Integrations synced in parallel by the scheduler path
    pub concurrency: usize,
}

impl SyncConfig {
    /// Load configuration from process environment
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading configuration from environment variables");
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        info!("{}", config.summary());
        Ok(config)
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let encryption_key = EncryptionKey::from_base64(&required(&lookup, ENCRYPTION_KEY_VAR)?)?;

        let whoop = WhoopConfig {
            client_id: required(&lookup, "WHOOP_CLIENT_ID")?,
            client_secret: required(&lookup, "WHOOP_CLIENT_SECRET")?,
            redirect_url: required(&lookup, "WHOOP_REDIRECT_URL")?,
            token_url: var_or(&lookup, "WHOOP_TOKEN_URL", DEFAULT_TOKEN_URL),
            api_base_url: var_or(&lookup, "WHOOP_API_BASE_URL", DEFAULT_API_BASE_URL),
            api_timeout: Duration::from_secs(parsed_or(
                &lookup,
                "WHOOP_API_TIMEOUT_SECS",
                DEFAULT_API_TIMEOUT_SECS,
            )?),
            token_timeout: Duration::from_secs(parsed_or(
                &lookup,
                "WHOOP_TOKEN_TIMEOUT_SECS",
                DEFAULT_TOKEN_TIMEOUT_SECS,
            )?),
        };

        let config = Self {
            encryption_key,
            whoop,
            database_url: var_or(&lookup, "DATABASE_URL", DEFAULT_DATABASE_URL),
            run_deadline: Duration::from_secs(parsed_or(
                &lookup,
                "SYNC_RUN_DEADLINE_SECS",
                DEFAULT_RUN_DEADLINE_SECS,
            )?),
            concurrency: parsed_or(&lookup, "SYNC_CONCURRENCY", DEFAULT_SYNC_CONCURRENCY)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for zero timeouts or zero concurrency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::invalid("SYNC_CONCURRENCY", "must be at least 1"));
        }
        if self.whoop.api_timeout.is_zero() {
            return Err(ConfigError::invalid("WHOOP_API_TIMEOUT_SECS", "must be at least 1"));
        }
        if self.whoop.token_timeout.is_zero() {
            return Err(ConfigError::invalid("WHOOP_TOKEN_TIMEOUT_SECS", "must be at least 1"));
        }
        if self.run_deadline.is_zero() {
            return Err(ConfigError::invalid("SYNC_RUN_DEADLINE_SECS", "must be at least 1"));
        }
        Ok(())
    }

    /// One-line summary for logs, without secrets
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "sync config: database={} api_base={} token_url={} api_timeout={}s token_timeout={}s run_deadline={}s concurrency={}",
            self.database_url,
            self.whoop.api_base_url,
            self.whoop.token_url,
            self.whoop.api_timeout.as_secs(),
            self.whoop.token_timeout.as_secs(),
            self.run_deadline.as_secs(),
            self.concurrency,
        )
    }
}

/// Required, non-empty variable
fn required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::missing(key))
}

/// Variable or default value
fn var_or<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_owned())
}

/// Parsed variable or default value
fn parsed_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::invalid(key, format!("{raw:?}: {e}"))),
        None => Ok(default),
    }
}
