// ABOUTME: Fixture builders for configuration, stores, services, and WHOOP payloads
// ABOUTME: Every fixture runs against in-memory SQLite and the scripted transport
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::fake_transport::FakeTransport;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use healthmetrics_core::constants::providers::WHOOP;
use healthmetrics_core::models::{ResourceType, StoredToken};
use healthmetrics_providers::whoop::constants::endpoint_path;
use healthmetrics_providers::HttpTransport;
use healthmetrics_sync::clock::{Clock, FixedClock};
use healthmetrics_sync::config::SyncConfig;
use healthmetrics_sync::context::SyncContext;
use healthmetrics_sync::crypto::TokenVault;
use healthmetrics_sync::database_plugins::{IntegrationStore, SqliteStore};
use healthmetrics_sync::metrics::SyncMetrics;
use healthmetrics_sync::sync::IntegrationService;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const API_BASE_URL: &str = "https://whoop.test/developer";
pub const TOKEN_URL: &str = "https://whoop.test/oauth/oauth2/token";
pub const TOKEN_PATH: &str = "/oauth/oauth2/token";
pub const REDIRECT_URL: &str = "https://app.test/integrations/whoop/callback";

/// base64 of 32 bytes of 0x07
pub const TEST_KEY_B64: &str = "BwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwc=";

/// Request path for a resource under the test base URL
pub fn api_path(resource: ResourceType) -> String {
    format!("/developer{}", endpoint_path(resource))
}

/// Variables a complete test configuration reads
pub fn test_env_vars() -> HashMap<String, String> {
    [
        ("WHOOP_TOKEN_ENCRYPTION_KEY", TEST_KEY_B64),
        ("WHOOP_CLIENT_ID", "client-123"),
        ("WHOOP_CLIENT_SECRET", "secret-456"),
        ("WHOOP_REDIRECT_URL", REDIRECT_URL),
        ("WHOOP_TOKEN_URL", TOKEN_URL),
        ("WHOOP_API_BASE_URL", API_BASE_URL),
        ("DATABASE_URL", "sqlite::memory:"),
        ("SYNC_CONCURRENCY", "2"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect()
}

pub fn test_config() -> SyncConfig {
    let vars = test_env_vars();
    SyncConfig::from_lookup(|key| vars.get(key).cloned()).expect("test config")
}

pub fn test_vault() -> TokenVault {
    TokenVault::from_key(&test_config().encryption_key).expect("test vault")
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
}

pub async fn memory_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::new("sqlite::memory:").await.expect("memory store"))
}

/// Fully wired service over in-memory storage and the scripted transport
pub struct TestEnv {
    pub config: SyncConfig,
    pub store: Arc<SqliteStore>,
    pub transport: Arc<FakeTransport>,
    pub clock: Arc<FixedClock>,
    pub metrics: Arc<SyncMetrics>,
    pub vault: TokenVault,
    pub service: IntegrationService,
}

pub async fn test_env() -> TestEnv {
    let config = test_config();
    let store = memory_store().await;
    let transport = Arc::new(FakeTransport::new());
    let clock = Arc::new(FixedClock::new(fixed_now()));
    let metrics = Arc::new(SyncMetrics::new());

    let service = IntegrationService::new(
        &config,
        Arc::clone(&store) as Arc<dyn IntegrationStore>,
        Arc::clone(&transport) as Arc<dyn HttpTransport>,
        Arc::clone(&clock) as Arc<dyn Clock>,
        Arc::clone(&metrics),
    )
    .expect("service");

    TestEnv {
        vault: test_vault(),
        config,
        store,
        transport,
        clock,
        metrics,
        service,
    }
}

impl TestEnv {
    pub fn ctx(&self) -> SyncContext {
        SyncContext::new("test-run", Duration::from_secs(30))
    }

    /// Insert a connected integration whose access token decrypts to `old_access`
    pub async fn connected_integration(
        &self,
        user_id: &str,
        expires_at: Option<DateTime<Utc>>,
        refresh_token: Option<&str>,
    ) -> Uuid {
        let id = self.store.upsert_integration(user_id, WHOOP).await.unwrap();
        let token = StoredToken {
            access_token_encrypted: self.vault.encrypt("old_access").unwrap(),
            refresh_token_encrypted: refresh_token.map(|r| self.vault.encrypt(r).unwrap()),
            expires_at,
            scopes: vec!["read:sleep".to_owned(), "offline".to_owned()],
        };
        self.store.upsert_token(id, &token).await.unwrap();
        self.store.mark_connected(id).await.unwrap();
        id
    }

    /// Token valid for an hour past the fixed clock
    pub async fn healthy_integration(&self, user_id: &str) -> Uuid {
        self.connected_integration(
            user_id,
            Some(fixed_now() + ChronoDuration::hours(1)),
            Some("old_refresh"),
        )
        .await
    }

    /// Profile, body, and four empty collections
    pub fn script_empty_account(&self) {
        self.transport
            .always_json(&api_path(ResourceType::Profile), 200, profile_json());
        self.transport.always_json(
            &api_path(ResourceType::BodyMeasurement),
            200,
            json!({ "height_meter": 1.83, "weight_kilogram": 82.5, "max_heart_rate": 194 }),
        );
        for resource in ResourceType::COLLECTIONS {
            self.transport
                .always_json(&api_path(resource), 200, page(vec![], None));
        }
    }

    /// Scripted refresh endpoint answer
    pub fn script_refresh(&self, body: Value) {
        self.transport.push_json(TOKEN_PATH, 200, body);
    }

    pub fn decrypt(&self, cipher: &str) -> String {
        self.vault.decrypt(cipher).unwrap()
    }
}

pub fn profile_json() -> Value {
    json!({
        "user_id": 10129,
        "email": "athlete@example.com",
        "first_name": "Jordan",
        "last_name": "Lee"
    })
}

/// Collection envelope
pub fn page(records: Vec<Value>, next_token: Option<&str>) -> Value {
    json!({ "records": records, "next_token": next_token })
}

pub fn sleep_json(id: &str, start: &str, end: &str, nap: bool) -> Value {
    json!({
        "id": id,
        "start": start,
        "end": end,
        "timezone_offset": "-05:00",
        "nap": nap,
        "score_state": "SCORED",
        "score": { "sleep_performance_percentage": 91.6 }
    })
}

pub fn recovery_json(cycle_id: i64, created_at: &str) -> Value {
    json!({
        "cycle_id": cycle_id,
        "sleep_id": "ecfc6a15-4661-442f-a9a4-f160dd7afae8",
        "created_at": created_at,
        "score_state": "SCORED",
        "score": {
            "recovery_score": 44.4,
            "resting_heart_rate": 64.2,
            "hrv_rmssd_milli": 31.813_562,
            "spo2_percentage": 95.6875
        }
    })
}

pub fn cycle_json(id: i64, start: &str, end: &str) -> Value {
    json!({
        "id": id,
        "start": start,
        "end": end,
        "timezone_offset": "-05:00",
        "score_state": "SCORED",
        "score": {
            "strain": 5.29,
            "kilojoule": 8288.3,
            "average_heart_rate": 68.4,
            "max_heart_rate": 141
        }
    })
}

pub fn workout_json(id: &str, start: &str, end: &str) -> Value {
    json!({
        "id": id,
        "start": start,
        "end": end,
        "timezone_offset": "+01:00",
        "sport_name": "running",
        "score_state": "SCORED",
        "score": {
            "strain": 8.25,
            "kilojoule": 1569.34,
            "distance_meter": 5230.0
        }
    })
}
