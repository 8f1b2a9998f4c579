// ABOUTME: Tests for IntegrationService entry points: exchange, sync_user, disconnect, sync_all
// ABOUTME: Covers input validation, connection status checks, and failure isolation across users
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod helpers;

use chrono::Duration as ChronoDuration;
use healthmetrics_core::constants::providers::WHOOP;
use healthmetrics_core::errors::{ErrorCode, SyncError};
use healthmetrics_core::models::{IntegrationStatus, ResourceType};
use healthmetrics_providers::HttpMethod;
use healthmetrics_sync::database_plugins::IntegrationStore;
use helpers::{api_path, fixed_now, test_env, REDIRECT_URL, TOKEN_PATH};
use serde_json::json;

fn token_grant() -> serde_json::Value {
    json!({
        "access_token": "fresh_access",
        "refresh_token": "fresh_refresh",
        "expires_in": 3600,
        "scope": "offline read:profile read:sleep",
        "token_type": "bearer"
    })
}

#[tokio::test]
async fn test_exchange_stores_encrypted_tokens_and_connects() {
    let env = test_env().await;
    env.transport.push_json(TOKEN_PATH, 200, token_grant());

    let id = env
        .service
        .exchange_credentials(&env.ctx(), "user-1", "auth-code", REDIRECT_URL)
        .await
        .unwrap();

    let request = &env.transport.requests()[0];
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.form_value("grant_type"), Some("authorization_code"));
    assert_eq!(request.form_value("code"), Some("auth-code"));
    assert_eq!(request.form_value("redirect_uri"), Some(REDIRECT_URL));
    assert_eq!(request.form_value("client_secret"), Some("secret-456"));

    let integration = env.store.get_integration("user-1", WHOOP).await.unwrap();
    assert_eq!(integration.id, id);
    assert_eq!(integration.status, IntegrationStatus::Connected);

    let stored = env.store.get_token(id).await.unwrap();
    assert_ne!(stored.access_token_encrypted, "fresh_access");
    assert_eq!(env.decrypt(&stored.access_token_encrypted), "fresh_access");
    assert_eq!(
        env.decrypt(stored.refresh_token_encrypted.as_deref().unwrap()),
        "fresh_refresh"
    );
    assert_eq!(stored.expires_at, Some(fixed_now() + ChronoDuration::seconds(3600)));
    assert_eq!(stored.scopes, vec!["offline", "read:profile", "read:sleep"]);

    let snapshot = env.metrics.snapshot();
    assert_eq!(snapshot.exchange_success, 1);
    assert_eq!(snapshot.exchange_failure, 0);
}

#[tokio::test]
async fn test_exchange_without_refresh_token_stores_none() {
    let env = test_env().await;
    env.transport.push_json(
        TOKEN_PATH,
        200,
        json!({ "access_token": "fresh_access", "expires_in": 3600 }),
    );

    let id = env
        .service
        .exchange_credentials(&env.ctx(), "user-1", "auth-code", REDIRECT_URL)
        .await
        .unwrap();

    let stored = env.store.get_token(id).await.unwrap();
    assert_eq!(stored.refresh_token_encrypted, None);
    assert!(stored.scopes.is_empty());
}

#[tokio::test]
async fn test_exchange_rejects_invalid_input_without_calls() {
    let env = test_env().await;
    let ctx = env.ctx();

    let cases = [
        ("", "code", REDIRECT_URL),
        ("user-1", " ", REDIRECT_URL),
        ("user-1", "code", ""),
        ("user-1", "code", "https://evil.test/callback"),
    ];
    for (user, code, redirect) in cases {
        let err = env
            .service
            .exchange_credentials(&ctx, user, code, redirect)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput, "{user:?} {code:?} {redirect:?}");
    }

    assert_eq!(env.transport.total_calls(), 0);
    assert_eq!(env.metrics.snapshot().exchange_failure, 4);
    assert!(env
        .store
        .get_integration("user-1", WHOOP)
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_exchange_without_access_token_fails() {
    let env = test_env().await;
    env.transport
        .push_json(TOKEN_PATH, 200, json!({ "refresh_token": "r", "expires_in": 3600 }));

    let err = env
        .service
        .exchange_credentials(&env.ctx(), "user-1", "auth-code", REDIRECT_URL)
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::ParseError);
    assert!(err.to_string().contains("code exchange"));
    assert!(env
        .store
        .get_integration("user-1", WHOOP)
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_exchange_rejected_code_is_upstream_error() {
    let env = test_env().await;
    env.transport
        .push_json(TOKEN_PATH, 400, json!({ "error": "invalid_grant" }));

    let err = env
        .service
        .exchange_credentials(&env.ctx(), "user-1", "stale", REDIRECT_URL)
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::UpstreamError);
}

#[tokio::test]
async fn test_sync_user_requires_integration() {
    let env = test_env().await;

    let err = env
        .service
        .sync_user(&env.ctx(), "ghost")
        .await
        .unwrap_err();

    assert_eq!(err, SyncError::not_found("ghost"));
    assert_eq!(env.transport.total_calls(), 0);
}

#[tokio::test]
async fn test_sync_user_requires_connected_status() {
    let env = test_env().await;
    let id = env.healthy_integration("user-1").await;
    env.store.mark_disconnected(id).await.unwrap();

    let err = env
        .service
        .sync_user(&env.ctx(), "user-1")
        .await
        .unwrap_err();

    assert_eq!(err, SyncError::not_connected(id));
    assert_eq!(err.code(), ErrorCode::NotConnected);
    assert_eq!(env.transport.total_calls(), 0);
}

#[tokio::test]
async fn test_exchange_then_sync_user() {
    let env = test_env().await;
    env.script_empty_account();
    env.transport.push_json(TOKEN_PATH, 200, token_grant());

    env.service
        .exchange_credentials(&env.ctx(), "user-1", "auth-code", REDIRECT_URL)
        .await
        .unwrap();
    let report = env.service.sync_user(&env.ctx(), "user-1").await.unwrap();

    assert!(!report.refreshed);
    assert_eq!(
        env.transport.requests_to(&api_path(ResourceType::Profile))[0].header_value("Authorization"),
        Some("Bearer fresh_access")
    );
}

#[tokio::test]
async fn test_disconnect_deletes_tokens_and_marks_disconnected() {
    let env = test_env().await;
    let id = env.healthy_integration("user-1").await;

    env.service.disconnect(&env.ctx(), "user-1").await.unwrap();

    assert!(!env.store.has_token(id).await.unwrap());
    let integration = env.store.get_integration("user-1", WHOOP).await.unwrap();
    assert_eq!(integration.status, IntegrationStatus::Disconnected);
    assert_eq!(env.metrics.snapshot().disconnect_total, 1);

    // a later sync is refused before touching tokens
    let err = env.service.sync_user(&env.ctx(), "user-1").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotConnected);
}

#[tokio::test]
async fn test_disconnect_unknown_user_is_not_found() {
    let env = test_env().await;

    let err = env
        .service
        .disconnect(&env.ctx(), "ghost")
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(env.metrics.snapshot().disconnect_failure, 1);
}

#[tokio::test]
async fn test_sync_all_isolates_failures() {
    let env = test_env().await;
    env.script_empty_account();

    let healthy = env.healthy_integration("user-ok").await;
    let broken = env
        .connected_integration("user-broken", Some(fixed_now() - ChronoDuration::hours(1)), None)
        .await;
    let parked = env.healthy_integration("user-parked").await;
    env.store.mark_disconnected(parked).await.unwrap();

    let outcomes = env.service.sync_all_connected(&env.ctx()).await.unwrap();

    assert_eq!(outcomes.len(), 2);
    let ok = outcomes.iter().find(|o| o.integration_id == healthy).unwrap();
    assert!(ok.is_success());
    assert!(ok
        .report
        .as_ref()
        .unwrap()
        .correlation_id
        .starts_with("test-run/"));

    let failed = outcomes.iter().find(|o| o.integration_id == broken).unwrap();
    assert!(!failed.is_success());
    assert_eq!(failed.user_id, "user-broken");
    assert_eq!(failed.error_code, Some(ErrorCode::MissingToken));

    let snapshot = env.metrics.snapshot();
    assert_eq!(snapshot.sync_total, 2);
    assert_eq!(snapshot.sync_success, 1);
    assert_eq!(snapshot.sync_failure, 1);
}

#[tokio::test]
async fn test_sync_all_with_nothing_connected() {
    let env = test_env().await;
    let outcomes = env.service.sync_all_connected(&env.ctx()).await.unwrap();
    assert!(outcomes.is_empty());
    assert_eq!(env.transport.total_calls(), 0);
}
