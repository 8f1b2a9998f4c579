// ABOUTME: Configuration module for the sync engine
// ABOUTME: Environment-only configuration loaded once at process startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Environment variable parsing and validation
pub mod environment;

pub use environment::{EncryptionKey, SyncConfig, WhoopConfig};
