// ABOUTME: Shared test helpers and utilities for integration tests
// ABOUTME: Exports the scripted WHOOP transport, store and service fixtures, and payload builders
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(dead_code)]

pub mod fake_transport;
pub mod fixtures;

pub use fake_transport::FakeTransport;
pub use fixtures::*;
