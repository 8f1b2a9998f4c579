// ABOUTME: WHOOP sync engine: token lifecycle, run orchestration, and service entry points
// ABOUTME: Each run is a single sequential unit of work scoped to one integration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Sequencing of one sync run
pub mod orchestrator;
/// Run reports returned to callers
pub mod report;
/// Handler and scheduler entry points
pub mod service;
/// Refresh-before-expiry token handling
pub mod token_manager;

pub use orchestrator::SyncOrchestrator;
pub use report::{ResourceReport, SyncOutcome, SyncReport};
pub use service::IntegrationService;
pub use token_manager::{AccessGrant, TokenManager, TokenState};
