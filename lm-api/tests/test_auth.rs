//! Token refresh and OAuth flows against a mock token endpoint.

mod common;

use std::time::Duration;

use lm_api::Credentials;
use lm_core::LmError;
use serde_json::{json, Value};
use tokio::task::JoinSet;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;

async fn mount_token(server: &MockServer, access_token: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_json(access_token))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_expired_token_refreshed_before_call() {
    let server = MockServer::start().await;
    mount_token(&server, "new-token", 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/contacts/1"))
        .and(header("authorization", "Bearer new-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(contact_json(1))))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, expired_credentials());
    client.contacts().get(1).await.unwrap();

    let credentials = client.credentials().await;
    assert_eq!(credentials.access_token(), "new-token");
    assert_eq!(credentials.refresh_token(), Some("refresh-2"));
    assert_eq!(credentials.token_type(), "Bearer");
    assert!(!credentials.is_expired());
}

#[tokio::test]
async fn test_concurrent_expired_calls_share_one_refresh() {
    let server = MockServer::start().await;
    mount_token(&server, "new-token", 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/contacts/1"))
        .and(header("authorization", "Bearer new-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(contact_json(1))))
        .expect(10)
        .mount(&server)
        .await;

    let client = create_test_client(&server, expired_credentials());
    let mut tasks = JoinSet::new();
    for _ in 0..10 {
        let client = client.clone();
        tasks.spawn(async move { client.contacts().get(1).await });
    }

    let mut succeeded = 0;
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
        succeeded += 1;
    }
    assert_eq!(succeeded, 10);
}

#[tokio::test]
async fn test_refresh_failure_skips_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Refresh token revoked"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = create_test_client(&server, expired_credentials());
    let err = client.contacts().get(1).await.unwrap_err();
    match err {
        LmError::Authentication(failure) => {
            assert_eq!(failure.message, "Refresh token revoked");
            assert_eq!(failure.code.as_deref(), Some("invalid_grant"));
        }
        other => panic!("expected Authentication, got {other:?}"),
    }
}

#[tokio::test]
async fn test_concurrent_callers_share_refresh_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": "invalid_client"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, expired_credentials());
    let mut tasks = JoinSet::new();
    for _ in 0..5 {
        let client = client.clone();
        tasks.spawn(async move { client.get::<Value>("/contacts").await });
    }
    while let Some(result) = tasks.join_next().await {
        assert!(matches!(result.unwrap(), Err(LmError::Authentication(_))));
    }
}

#[tokio::test]
async fn test_unauthorized_triggers_refresh_and_retry() {
    let server = MockServer::start().await;
    mount_token(&server, "new-token", 1).await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer stale-token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "token revoked"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer new-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(contact_json(3))))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = Credentials::new("stale-token")
        .unwrap()
        .with_refresh_token("refresh-1")
        .with_expires_in(3600);
    let client = create_test_client(&server, credentials);
    let contact = client.contacts().get(3).await.unwrap();
    assert_eq!(contact.id, 3);
}

#[tokio::test]
async fn test_unauthorized_twice_is_authentication_error() {
    let server = MockServer::start().await;
    mount_token(&server, "new-token", 1).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let credentials = Credentials::new("stale-token")
        .unwrap()
        .with_refresh_token("refresh-1");
    let client = create_test_client(&server, credentials);
    let err = client.get::<Value>("/contacts").await.unwrap_err();
    assert!(matches!(err, LmError::Authentication(_)));
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_unauthorized_without_refresh_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, fresh_credentials());
    let err = client.get::<Value>("/contacts").await.unwrap_err();
    assert!(matches!(err, LmError::Authentication(_)));
}

#[tokio::test]
async fn test_explicit_refresh() {
    let server = MockServer::start().await;
    mount_token(&server, "manual-token", 1).await;

    let credentials = Credentials::new("current")
        .unwrap()
        .with_refresh_token("refresh-1")
        .with_expires_in(3600);
    let client = create_test_client(&server, credentials);
    client.refresh_token().await.unwrap();
    assert_eq!(client.credentials().await.access_token(), "manual-token");
}

#[tokio::test]
async fn test_explicit_refresh_without_refresh_token() {
    let server = MockServer::start().await;
    let client = create_test_client(&server, fresh_credentials());
    let err = client.refresh_token().await.unwrap_err();
    assert!(matches!(err, LmError::Authentication(_)));
}

#[tokio::test]
async fn test_updated_credentials_used_for_next_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer rotated"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]))))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, fresh_credentials());
    client
        .update_credentials("rotated", None, Some(3600))
        .await
        .unwrap();
    let page = client
        .contacts()
        .list(&lm_api::ListParams::new())
        .await
        .unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn test_exchange_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json("issued")))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, fresh_credentials());
    let credentials = client.oauth().exchange_code("abc123").await.unwrap();
    assert_eq!(credentials.access_token(), "issued");
    assert_eq!(credentials.refresh_token(), Some("refresh-2"));
    assert!(credentials.expires_at().is_some());
}

#[tokio::test]
async fn test_update_credentials_with_out_of_range_lifetime() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/contacts/1"))
        .and(header("authorization", "Bearer long-lived"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(contact_json(1))))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, fresh_credentials());
    client
        .update_credentials("long-lived", None, Some(i64::MAX))
        .await
        .unwrap();
    assert!(!client.credentials().await.is_expired());
    client.contacts().get(1).await.unwrap();
}

#[tokio::test]
async fn test_exchange_code_with_out_of_range_lifetime() {
    let server = MockServer::start().await;
    let mut token = token_json("issued");
    token["expires_in"] = json!(i64::MAX);
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, fresh_credentials());
    let credentials = client.oauth().exchange_code("abc").await.unwrap();
    assert_eq!(credentials.access_token(), "issued");
    assert!(!credentials.is_expired());
}

#[tokio::test]
async fn test_refresh_with_out_of_range_lifetime() {
    let server = MockServer::start().await;
    let mut token = token_json("new-token");
    token["expires_in"] = json!(i64::MAX);
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/contacts/1"))
        .and(header("authorization", "Bearer new-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(contact_json(1))))
        .expect(2)
        .mount(&server)
        .await;

    let client = create_test_client(&server, expired_credentials());
    client.contacts().get(1).await.unwrap();
    // The saturated expiry is recorded, so the second call skips refresh.
    client.contacts().get(1).await.unwrap();
    assert!(!client.credentials().await.is_expired());
}
