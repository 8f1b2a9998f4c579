// ABOUTME: Provider identifiers and fixed limits shared across the sync engine
// ABOUTME: Refresh margin, last-error truncation length, and provider names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Provider identifiers as stored in the `integrations.provider` column
pub mod providers {
    /// WHOOP wearable provider
    pub const WHOOP: &str = "whoop";
}

/// Token lifecycle constants
pub mod tokens {
    /// Tokens expiring within this many seconds are refreshed before use
    pub const REFRESH_MARGIN_SECS: i64 = 60;
}

/// Sync bookkeeping constants
pub mod sync {
    /// Maximum number of characters kept from a failure message in `last_error`
    pub const LAST_ERROR_MAX_CHARS: usize = 500;
}
