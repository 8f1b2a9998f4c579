// ABOUTME: Error taxonomy for the integration sync engine with stable error codes
// ABOUTME: Maps vault, provider, database, and config failures onto SyncError
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Error Types
//!
//! Each layer owns a small error enum:
//! - [`VaultError`] for token encryption
//! - [`ProviderError`] for remote calls
//! - [`DatabaseError`] for the persistence layer
//! - [`ConfigError`] for startup configuration
//!
//! [`SyncError`] is what the public entry points return. Callers inspect
//! [`SyncError::code`] to decide how to surface a failure.

/// Startup configuration errors
pub mod config;
/// Persistence layer errors
pub mod database;
/// Remote provider call errors
pub mod provider;
/// Credential vault errors
pub mod vault;

pub use config::ConfigError;
pub use database::DatabaseError;
pub use provider::ProviderError;
pub use vault::VaultError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable, serializable classification of a [`SyncError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Missing or malformed process configuration
    ConfigError,
    /// No usable credential is stored for the integration
    MissingToken,
    /// No integration exists for the user
    NotFound,
    /// Integration exists but is not connected
    NotConnected,
    /// Caller supplied invalid input
    InvalidInput,
    /// Stored ciphertext is corrupt or was tampered with
    DecryptionFailed,
    /// Encryption failed for a reason other than bad input
    VaultError,
    /// Provider rejected the access token
    UpstreamUnauthorized,
    /// Provider returned an error status or the transport failed
    UpstreamError,
    /// A provider call or the run deadline expired
    UpstreamTimeout,
    /// Provider response could not be decoded
    ParseError,
    /// Storage layer failure
    PersistenceError,
    /// The run was cancelled by the caller
    Cancelled,
}

impl ErrorCode {
    /// Human readable description of the code
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ConfigError => "Configuration is missing or invalid",
            Self::MissingToken => "No usable credential is stored for this integration",
            Self::NotFound => "Integration not found",
            Self::NotConnected => "Integration is not connected",
            Self::InvalidInput => "Invalid input",
            Self::DecryptionFailed => "Stored credential could not be decrypted",
            Self::VaultError => "Credential encryption failed",
            Self::UpstreamUnauthorized => "Provider rejected the access token",
            Self::UpstreamError => "Provider request failed",
            Self::UpstreamTimeout => "Provider request timed out",
            Self::ParseError => "Provider response could not be decoded",
            Self::PersistenceError => "Storage operation failed",
            Self::Cancelled => "Sync was cancelled",
        }
    }

    /// Whether the caller must act (reconnect, fix input) before retrying
    #[must_use]
    pub const fn is_client_actionable(self) -> bool {
        matches!(
            self,
            Self::MissingToken
                | Self::NotFound
                | Self::NotConnected
                | Self::InvalidInput
                | Self::UpstreamUnauthorized
        )
    }
}

/// Errors returned by the sync engine entry points
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Process configuration is missing or malformed
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No token row exists, or the token expired without a refresh token
    #[error("missing token")]
    MissingToken,

    /// No integration exists for the user
    #[error("integration not found for user {user_id}")]
    NotFound {
        /// User that was looked up
        user_id: String,
    },

    /// The integration is present but disconnected
    #[error("integration {integration_id} is not connected")]
    NotConnected {
        /// Integration that was looked up
        integration_id: String,
    },

    /// Caller supplied invalid input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Stored ciphertext failed to decode or authenticate
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// Encryption failed
    #[error("vault error: {0}")]
    Vault(String),

    /// Provider answered 401
    #[error("upstream unauthorized: {0}")]
    UpstreamUnauthorized(String),

    /// Provider answered with another error status, or the connection failed
    #[error("upstream error: {0}")]
    UpstreamError(String),

    /// A request or the run deadline expired
    #[error("upstream timeout: {0}")]
    UpstreamTimeout(String),

    /// Provider response could not be decoded
    #[error("parse error: {0}")]
    ParseError(String),

    /// Storage layer failure
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Cancellation was signalled while the run was in flight
    #[error("sync cancelled")]
    Cancelled,
}

impl SyncError {
    /// Create an "invalid input" error
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a "not found" error
    #[must_use]
    pub fn not_found(user_id: impl Into<String>) -> Self {
        Self::NotFound {
            user_id: user_id.into(),
        }
    }

    /// Create a "not connected" error
    #[must_use]
    pub fn not_connected(integration_id: impl ToString) -> Self {
        Self::NotConnected {
            integration_id: integration_id.to_string(),
        }
    }

    /// Stable code for this error
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Config(_) => ErrorCode::ConfigError,
            Self::MissingToken => ErrorCode::MissingToken,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::NotConnected { .. } => ErrorCode::NotConnected,
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::DecryptionFailed(_) => ErrorCode::DecryptionFailed,
            Self::Vault(_) => ErrorCode::VaultError,
            Self::UpstreamUnauthorized(_) => ErrorCode::UpstreamUnauthorized,
            Self::UpstreamError(_) => ErrorCode::UpstreamError,
            Self::UpstreamTimeout(_) => ErrorCode::UpstreamTimeout,
            Self::ParseError(_) => ErrorCode::ParseError,
            Self::Persistence(_) => ErrorCode::PersistenceError,
            Self::Cancelled => ErrorCode::Cancelled,
        }
    }

    /// Prefix the message with the orchestration step that failed
    ///
    /// Variants without a free-form message are returned unchanged so callers
    /// can still match on them.
    #[must_use]
    pub fn context(self, step: &str) -> Self {
        let prefix = |message: String| format!("{step}: {message}");
        match self {
            Self::InvalidInput(m) => Self::InvalidInput(prefix(m)),
            Self::DecryptionFailed(m) => Self::DecryptionFailed(prefix(m)),
            Self::Vault(m) => Self::Vault(prefix(m)),
            Self::UpstreamUnauthorized(m) => Self::UpstreamUnauthorized(prefix(m)),
            Self::UpstreamError(m) => Self::UpstreamError(prefix(m)),
            Self::UpstreamTimeout(m) => Self::UpstreamTimeout(prefix(m)),
            Self::ParseError(m) => Self::ParseError(prefix(m)),
            Self::Persistence(m) => Self::Persistence(prefix(m)),
            other => other,
        }
    }

    /// Message without the classification prefix
    ///
    /// After [`SyncError::context`] this reads `"<step>: <cause>"`. Variants
    /// without a free-form message fall back to their display text.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::InvalidInput(m)
            | Self::DecryptionFailed(m)
            | Self::Vault(m)
            | Self::UpstreamUnauthorized(m)
            | Self::UpstreamError(m)
            | Self::UpstreamTimeout(m)
            | Self::ParseError(m)
            | Self::Persistence(m) => m.clone(),
            other => other.to_string(),
        }
    }
}

impl From<VaultError> for SyncError {
    fn from(error: VaultError) -> Self {
        match error {
            VaultError::DecryptionFailed { reason } => Self::DecryptionFailed(reason),
            VaultError::KeyConfig { reason } => {
                Self::Config(ConfigError::invalid(config::ENCRYPTION_KEY_VAR, reason))
            }
            other @ (VaultError::EmptyInput | VaultError::EncryptionFailed { .. }) => {
                Self::Vault(other.to_string())
            }
        }
    }
}

impl From<ProviderError> for SyncError {
    fn from(error: ProviderError) -> Self {
        let message = error.to_string();
        match error {
            ProviderError::Unauthorized { .. } => Self::UpstreamUnauthorized(message),
            ProviderError::Timeout { .. } => Self::UpstreamTimeout(message),
            ProviderError::Parse { .. } | ProviderError::MissingField { .. } => {
                Self::ParseError(message)
            }
            ProviderError::Api { .. } | ProviderError::Transport { .. } => {
                Self::UpstreamError(message)
            }
        }
    }
}

impl From<DatabaseError> for SyncError {
    fn from(error: DatabaseError) -> Self {
        Self::Persistence(error.to_string())
    }
}

/// Result alias for sync engine operations
pub type SyncResult<T> = Result<T, SyncError>;
