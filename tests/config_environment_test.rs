// ABOUTME: Tests for environment configuration of the sync engine
// ABOUTME: Required variables, defaults, key validation, and numeric parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod helpers;

use healthmetrics_core::errors::config::ENCRYPTION_KEY_VAR;
use healthmetrics_core::errors::ConfigError;
use healthmetrics_sync::config::{EncryptionKey, SyncConfig};
use helpers::{test_env_vars, TEST_KEY_B64};
use serial_test::serial;
use std::collections::HashMap;
use std::env;
use std::time::Duration;

fn load(vars: &HashMap<String, String>) -> Result<SyncConfig, ConfigError> {
    SyncConfig::from_lookup(|key| vars.get(key).cloned())
}

fn without(key: &str) -> HashMap<String, String> {
    let mut vars = test_env_vars();
    vars.remove(key);
    vars
}

fn with(key: &str, value: &str) -> HashMap<String, String> {
    let mut vars = test_env_vars();
    vars.insert(key.to_owned(), value.to_owned());
    vars
}

#[test]
fn test_complete_configuration_loads() {
    let config = load(&test_env_vars()).unwrap();

    assert_eq!(config.whoop.client_id, "client-123");
    assert_eq!(config.whoop.client_secret, "secret-456");
    assert_eq!(config.encryption_key.as_bytes(), &[7u8; 32]);
    assert_eq!(config.concurrency, 2);
}

#[test]
fn test_defaults_apply_when_optional_vars_absent() {
    let mut vars = HashMap::new();
    for key in [
        ENCRYPTION_KEY_VAR,
        "WHOOP_CLIENT_ID",
        "WHOOP_CLIENT_SECRET",
        "WHOOP_REDIRECT_URL",
    ] {
        vars.insert(key.to_owned(), test_env_vars()[key].clone());
    }

    let config = load(&vars).unwrap();

    assert_eq!(config.whoop.token_url, "https://api.prod.whoop.com/oauth/oauth2/token");
    assert_eq!(config.whoop.api_base_url, "https://api.prod.whoop.com/developer");
    assert_eq!(config.whoop.api_timeout, Duration::from_secs(30));
    assert_eq!(config.whoop.token_timeout, Duration::from_secs(10));
    assert_eq!(config.run_deadline, Duration::from_secs(300));
    assert_eq!(config.concurrency, 4);
    assert_eq!(config.database_url, "sqlite:./data/healthmetrics.db");
}

#[test]
fn test_missing_required_variables() {
    for key in [
        ENCRYPTION_KEY_VAR,
        "WHOOP_CLIENT_ID",
        "WHOOP_CLIENT_SECRET",
        "WHOOP_REDIRECT_URL",
    ] {
        let err = load(&without(key)).unwrap_err();
        assert_eq!(err, ConfigError::missing(key));
    }
}

#[test]
fn test_blank_required_variable_is_missing() {
    let err = load(&with("WHOOP_CLIENT_ID", "   ")).unwrap_err();
    assert_eq!(err, ConfigError::missing("WHOOP_CLIENT_ID"));
}

#[test]
fn test_encryption_key_must_be_base64_of_32_bytes() {
    let err = load(&with(ENCRYPTION_KEY_VAR, "%%%not-base64%%%")).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }));
    assert_eq!(err.variable(), ENCRYPTION_KEY_VAR);

    // 16 bytes
    let err = load(&with(ENCRYPTION_KEY_VAR, "AAAAAAAAAAAAAAAAAAAAAA==")).unwrap_err();
    assert!(err.to_string().contains("32 bytes"));
}

#[test]
fn test_encryption_key_debug_is_redacted() {
    let key = EncryptionKey::from_base64(TEST_KEY_B64).unwrap();
    assert_eq!(format!("{key:?}"), "EncryptionKey([REDACTED])");
}

#[test]
fn test_numeric_variables_validated() {
    let err = load(&with("SYNC_CONCURRENCY", "many")).unwrap_err();
    assert_eq!(err.variable(), "SYNC_CONCURRENCY");

    let err = load(&with("SYNC_CONCURRENCY", "0")).unwrap_err();
    assert_eq!(err, ConfigError::invalid("SYNC_CONCURRENCY", "must be at least 1"));

    let err = load(&with("WHOOP_API_TIMEOUT_SECS", "0")).unwrap_err();
    assert_eq!(err.variable(), "WHOOP_API_TIMEOUT_SECS");

    let err = load(&with("SYNC_RUN_DEADLINE_SECS", "-5")).unwrap_err();
    assert_eq!(err.variable(), "SYNC_RUN_DEADLINE_SECS");
}

#[test]
fn test_summary_omits_secrets() {
    let config = load(&test_env_vars()).unwrap();
    let summary = config.summary();
    let debug = format!("{config:?}");

    assert!(summary.contains("concurrency=2"));
    for rendered in [&summary, &debug] {
        assert!(!rendered.contains("secret-456"));
        assert!(!rendered.contains(TEST_KEY_B64));
    }
}

#[test]
#[serial]
fn test_from_env_reads_process_environment() {
    let vars = test_env_vars();
    for (key, value) in &vars {
        env::set_var(key, value);
    }

    let config = SyncConfig::from_env().unwrap();
    assert_eq!(config.whoop.redirect_url, vars["WHOOP_REDIRECT_URL"]);
    assert_eq!(config.concurrency, 2);

    for key in vars.keys() {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_from_env_fails_without_key() {
    env::remove_var(ENCRYPTION_KEY_VAR);
    let err = SyncConfig::from_env().unwrap_err();
    assert_eq!(err, ConfigError::missing(ENCRYPTION_KEY_VAR));
}
