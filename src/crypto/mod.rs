// ABOUTME: Cryptographic utilities for protecting stored provider credentials
// ABOUTME: AES-256-GCM token vault with a process-wide key
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Token encryption and decryption
pub mod vault;

pub use vault::TokenVault;
