// ABOUTME: Configuration error types raised while loading process environment
// ABOUTME: Missing and invalid variables are startup-fatal for the sync engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use thiserror::Error;

/// Environment variable holding the base64 token encryption key
pub const ENCRYPTION_KEY_VAR: &str = "WHOOP_TOKEN_ENCRYPTION_KEY";

/// Configuration loading failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty
    #[error("{variable} is required but was not set")]
    Missing {
        /// Name of the environment variable
        variable: String,
    },
    /// A variable is present but cannot be used
    #[error("{variable} is invalid: {reason}")]
    Invalid {
        /// Name of the environment variable
        variable: String,
        /// Why the value was rejected
        reason: String,
    },
}

impl ConfigError {
    /// Create a "missing variable" error
    #[must_use]
    pub fn missing(variable: impl Into<String>) -> Self {
        Self::Missing {
            variable: variable.into(),
        }
    }

    /// Create an "invalid variable" error
    #[must_use]
    pub fn invalid(variable: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            variable: variable.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending variable
    #[must_use]
    pub fn variable(&self) -> &str {
        match self {
            Self::Missing { variable } | Self::Invalid { variable, .. } => variable,
        }
    }
}
