// ABOUTME: Domain models for provider integrations and their normalized records
// ABOUTME: Integration status, stored tokens, resource types, sleep/recovery/workout/cycle rows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

mod integration;
mod records;
mod resource;

pub use integration::{
    ConnectedIntegration, Integration, IntegrationConnection, IntegrationStatus, StoredToken,
};
pub use records::{CycleRecord, NormalizedRecord, RecoveryRecord, SleepRecord, WorkoutRecord};
pub use resource::ResourceType;
