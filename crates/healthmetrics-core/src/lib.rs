// ABOUTME: Core types and constants for the healthmetrics integration sync engine
// ABOUTME: Foundation crate with error taxonomy, integration models, and payload accessors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Healthmetrics Core
//!
//! Foundation crate shared by the provider plumbing and the sync engine. It is
//! designed to change infrequently so the heavier crates recompile less.
//!
//! ## Modules
//!
//! - **errors**: Layered error types (`VaultError`, `ProviderError`, `DatabaseError`,
//!   `ConfigError`) and the top-level `SyncError` with stable `ErrorCode`s
//! - **models**: Integrations, stored tokens, resource types, and normalized records
//! - **payload**: Tagged accessors over open provider JSON
//! - **constants**: Provider names and sync limits

/// Error taxonomy for the sync engine
pub mod errors;

/// Provider identifiers and sync limits
pub mod constants;

/// Integration, token, and normalized record models
pub mod models;

/// Tagged, fallible accessors over provider JSON payloads
pub mod payload;
