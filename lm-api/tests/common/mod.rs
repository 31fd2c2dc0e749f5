//! Shared test utilities for integration tests.

#![allow(dead_code)]

use lm_api::{ApiClient, Credentials};
use lm_core::SdkConfig;
use serde_json::{json, Value};
use wiremock::MockServer;

/// Configuration pointing both the API and the token endpoint at `server`,
/// with retry delays short enough for tests.
pub fn create_test_config(server: &MockServer) -> SdkConfig {
    let mut config = SdkConfig::default();
    config.api.base_url = server.uri();
    config.api.retry_delay_ms = 10;
    config.api.max_retry_delay_ms = 100;
    config.oauth.token_url = format!("{}/oauth/token", server.uri());
    config.oauth.redirect_uri = Some("https://app.example.com/callback".into());
    config
}

/// Valid for an hour, no refresh token.
pub fn fresh_credentials() -> Credentials {
    Credentials::new("test-token")
        .expect("credentials")
        .with_expires_in(3600)
}

/// Expired a minute ago, refreshable.
pub fn expired_credentials() -> Credentials {
    Credentials::new("old-token")
        .expect("credentials")
        .with_refresh_token("refresh-1")
        .with_client("client-id", "client-secret")
        .with_expires_in(-60)
}

pub fn create_test_client(server: &MockServer, credentials: Credentials) -> ApiClient {
    ApiClient::new(&create_test_config(server), credentials).expect("client")
}

pub fn contact_json(id: i64) -> Value {
    json!({
        "id": id,
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": format!("ada{id}@example.com"),
        "tags": ["vip"]
    })
}

pub fn token_json(access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "refresh_token": "refresh-2",
        "expires_in": 3600,
        "token_type": "bearer"
    })
}

/// `{"data": data}`
pub fn envelope(data: Value) -> Value {
    json!({ "data": data })
}

/// List envelope for page `page` of `total_pages`.
pub fn page_envelope(items: Vec<Value>, page: u32, per_page: u32, total: u64) -> Value {
    json!({
        "data": items,
        "pagination": {
            "current_page": page,
            "per_page": per_page,
            "total": total
        }
    })
}
