// ABOUTME: Database error types for the integration persistence layer
// ABOUTME: Carries the storage-layer context that produced each failure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use thiserror::Error;

/// Persistence failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    /// Requested row does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of row that was looked up
        entity: &'static str,
        /// Lookup key
        id: String,
    },

    /// Query failed
    #[error("database query failed: {context}")]
    QueryError {
        /// What was being done and why it failed
        context: String,
    },

    /// Schema migration failed
    #[error("database migration failed: {context}")]
    MigrationError {
        /// Which table or step failed
        context: String,
    },

    /// A column could not be encoded or decoded
    #[error("database value could not be converted: {context}")]
    Serialization {
        /// Which value failed
        context: String,
    },
}

impl DatabaseError {
    /// Create a not-found error
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Create a query error with context
    #[must_use]
    pub fn query(context: impl Into<String>) -> Self {
        Self::QueryError {
            context: context.into(),
        }
    }

    /// Create a serialization error with context
    #[must_use]
    pub fn serialization(context: impl Into<String>) -> Self {
        Self::Serialization {
            context: context.into(),
        }
    }

    /// Whether this is a not-found error
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
