// ABOUTME: Provider resource kinds fetched during a sync run
// ABOUTME: Fixes the collection order and single-object fallback source ids
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource kinds retrieved from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// Basic user profile (single object)
    Profile,
    /// Body measurements (single object)
    BodyMeasurement,
    /// Physiological cycles (paginated)
    Cycle,
    /// Recovery scores (paginated)
    Recovery,
    /// Sleep sessions (paginated)
    Sleep,
    /// Workouts (paginated)
    Workout,
}

impl ResourceType {
    /// Single-object resources in fetch order
    pub const SINGLE_OBJECTS: [Self; 2] = [Self::Profile, Self::BodyMeasurement];

    /// Paginated collections in fetch order
    pub const COLLECTIONS: [Self; 4] = [Self::Cycle, Self::Recovery, Self::Sleep, Self::Workout];

    /// Value stored in `integration_raw_events.resource_type`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::BodyMeasurement => "body_measurement",
            Self::Cycle => "cycle",
            Self::Recovery => "recovery",
            Self::Sleep => "sleep",
            Self::Workout => "workout",
        }
    }

    /// Source id used when a single-object payload carries no id of its own
    #[must_use]
    pub const fn fallback_source_id(self) -> Option<&'static str> {
        match self {
            Self::Profile => Some("profile"),
            Self::BodyMeasurement => Some("body"),
            _ => None,
        }
    }

    /// Whether records of this kind are normalized into a typed table
    #[must_use]
    pub const fn is_normalized(self) -> bool {
        matches!(
            self,
            Self::Cycle | Self::Recovery | Self::Sleep | Self::Workout
        )
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
