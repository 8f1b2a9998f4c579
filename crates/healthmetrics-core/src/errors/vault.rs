// ABOUTME: Credential vault error types for token encryption and decryption
// ABOUTME: Decryption never yields partial plaintext, every failure is an error
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use thiserror::Error;

/// Token encryption failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    /// Plaintext or ciphertext was empty
    #[error("input must not be empty")]
    EmptyInput,
    /// Key is missing, not base64, or not 32 bytes
    #[error("encryption key misconfigured: {reason}")]
    KeyConfig {
        /// Details about the key problem
        reason: String,
    },
    /// Ciphertext is malformed, truncated, or fails authentication
    #[error("{reason}")]
    DecryptionFailed {
        /// Details about the failure
        reason: String,
    },
    /// The AEAD seal operation failed
    #[error("encryption failed: {reason}")]
    EncryptionFailed {
        /// Details about the failure
        reason: String,
    },
}

impl VaultError {
    /// Create a key configuration error
    #[must_use]
    pub fn key_config(reason: impl Into<String>) -> Self {
        Self::KeyConfig {
            reason: reason.into(),
        }
    }

    /// Create a decryption error
    #[must_use]
    pub fn decryption_failed(reason: impl Into<String>) -> Self {
        Self::DecryptionFailed {
            reason: reason.into(),
        }
    }

    /// Create an encryption error
    #[must_use]
    pub fn encryption_failed(reason: impl Into<String>) -> Self {
        Self::EncryptionFailed {
            reason: reason.into(),
        }
    }
}
