// ABOUTME: Provider plumbing for the healthmetrics sync engine
// ABOUTME: HTTP transport seam, WHOOP OAuth client, paginated fetcher, and normalizer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Provider plumbing for the sync engine.
//!
//! Everything that talks to a provider goes through [`HttpTransport`], so the
//! sync engine and its tests can swap the network for a scripted fake.

/// HTTP transport seam and the shared `reqwest` implementation
pub mod http_client;

/// WHOOP provider: OAuth exchange, REST fetcher, normalizer
#[cfg(feature = "provider-whoop")]
pub mod whoop;

pub use http_client::{
    initialize_shared_client, shared_client, HttpMethod, HttpRequest, HttpResponse,
    HttpTransport, ReqwestTransport, TransportError,
};
