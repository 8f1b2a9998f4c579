// ABOUTME: WHOOP endpoint paths, default URLs, and pagination limits
// ABOUTME: Maps each resource type to its v2 developer API path
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use healthmetrics_core::models::ResourceType;

/// Default developer API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.prod.whoop.com/developer";

/// Default OAuth token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://api.prod.whoop.com/oauth/oauth2/token";

/// Records requested per page
pub const PAGE_LIMIT: u32 = 25;

/// Pages fetched per collection per run, regardless of `next_token`
pub const MAX_PAGES: usize = 5;

/// API path for a resource
#[must_use]
pub const fn endpoint_path(resource: ResourceType) -> &'static str {
    match resource {
        ResourceType::Profile => "/v2/user/profile/basic",
        ResourceType::BodyMeasurement => "/v2/user/measurement/body",
        ResourceType::Cycle => "/v2/cycle",
        ResourceType::Recovery => "/v2/recovery",
        ResourceType::Sleep => "/v2/activity/sleep",
        ResourceType::Workout => "/v2/activity/workout",
    }
}
