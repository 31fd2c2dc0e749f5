//! Request pipeline behavior against a mock LawMatics server: retries,
//! error classification, headers and cancellation.

mod common;

use std::time::{Duration, Instant};

use lm_api::{CancellationToken, RequestDescriptor};
use lm_core::LmError;
use lm_models::Contact;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;

#[tokio::test]
async fn test_server_errors_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/contacts/1"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(3)
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/contacts/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(contact_json(1))))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, fresh_credentials());
    let contact: Contact = client.contacts().get(1).await.unwrap();
    assert_eq!(contact.id, 1);
    assert_eq!(contact.display_name(), "Ada Lovelace");
}

#[tokio::test]
async fn test_retries_exhausted_returns_last_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/contacts/1"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({"message": "maintenance"})),
        )
        .expect(4)
        .mount(&server)
        .await;

    let client = create_test_client(&server, fresh_credentials());
    let err = client.contacts().get(1).await.unwrap_err();
    assert!(matches!(err, LmError::Api(_)));
    assert_eq!(err.status(), Some(503));
    assert_eq!(err.failure().unwrap().message, "maintenance");
}

#[tokio::test]
async fn test_retry_disabled_makes_one_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server);
    config.api.enable_retry = false;
    let client = lm_api::ApiClient::new(&config, fresh_credentials()).unwrap();
    let err = client.get::<Value>("/contacts/1").await.unwrap_err();
    assert_eq!(err.status(), Some(502));
}

#[tokio::test]
async fn test_rate_limit_honors_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/contacts/1"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/contacts/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(contact_json(1))))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, fresh_credentials());
    let started = Instant::now();
    let contact = client.contacts().get(1).await.unwrap();
    assert_eq!(contact.id, 1);
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_rate_limit_exhausted_carries_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(4)
        .mount(&server)
        .await;

    let client = create_test_client(&server, fresh_credentials());
    let err = client.get::<Value>("/contacts").await.unwrap_err();
    match err {
        LmError::RateLimited { retry_after, .. } => {
            assert_eq!(retry_after, Some(Duration::ZERO))
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn test_client_errors_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/contacts/9"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "error": {"code": "validation_failed", "message": "Email is invalid",
                      "details": {"email": ["is invalid"]}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, fresh_credentials());
    let input = lm_models::ContactInput {
        email: Some("nope".into()),
        ..Default::default()
    };
    let err = client.contacts().update(9, &input).await.unwrap_err();
    let failure = err.failure().unwrap();
    assert_eq!(failure.status, Some(422));
    assert_eq!(failure.code.as_deref(), Some("validation_failed"));
    assert!(failure.details.as_ref().unwrap().contains_key("email"));
}

#[tokio::test]
async fn test_error_details_suppressed_when_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "Bad filter", "details": {"status": ["unknown"]}}
        })))
        .mount(&server)
        .await;

    let mut config = create_test_config(&server);
    config.api.include_error_details = false;
    let client = lm_api::ApiClient::new(&config, fresh_credentials()).unwrap();
    let err = client.get::<Value>("/matters").await.unwrap_err();
    let failure = err.failure().unwrap();
    assert_eq!(failure.message, "Bad filter");
    assert!(failure.details.is_none());
}

#[tokio::test]
async fn test_not_found_reports_resource() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/contacts/42"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"message": "Contact not found"}))
                .insert_header("X-Correlation-Id", "corr-42"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, fresh_credentials());
    let err = client.contacts().get(42).await.unwrap_err();
    assert_eq!(err.correlation_id(), Some("corr-42"));
    match err {
        LmError::NotFound {
            resource_type,
            resource_id,
            failure,
        } => {
            assert_eq!(resource_type.as_deref(), Some("contacts"));
            assert_eq!(resource_id.as_deref(), Some("42"));
            assert_eq!(failure.status, Some(404));
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_correlation_id_falls_back_to_request_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let client = create_test_client(&server, fresh_credentials());
    let err = client.get::<Value>("/contacts").await.unwrap_err();
    let correlation = err.correlation_id().unwrap().to_string();

    let requests = server.received_requests().await.unwrap();
    let sent = requests[0].headers.get("x-request-id").unwrap().to_str().unwrap();
    assert_eq!(correlation, sent);
    assert_eq!(err.failure().unwrap().message, "Bad Request");
}

#[tokio::test]
async fn test_delete_no_content_is_true() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/contacts/5"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, fresh_credentials());
    assert!(client.contacts().delete(5).await.unwrap());
}

#[tokio::test]
async fn test_delete_ignores_unparseable_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200).set_body_string("deleted"))
        .mount(&server)
        .await;

    let client = create_test_client(&server, fresh_credentials());
    assert!(client.delete("/notes/3").await.unwrap());
}

#[tokio::test]
async fn test_headers_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/contacts/1"))
        .and(header("authorization", "Bearer test-token"))
        .and(header("accept", "application/json"))
        .and(header("x-firm-id", "acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(contact_json(1))))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server);
    config
        .api
        .custom_headers
        .insert("X-Firm-Id".into(), "acme".into());
    config.api.user_agent = "lawmatics-tests/1.0".into();
    let client = lm_api::ApiClient::new(&config, fresh_credentials()).unwrap();
    client.contacts().get(1).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let headers = &requests[0].headers;
    assert_eq!(headers.get("user-agent").unwrap(), "lawmatics-tests/1.0");
    assert!(headers.get("x-request-id").is_some());
}

#[tokio::test]
async fn test_null_members_stripped_from_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/notes"))
        .and(body_json(json!({"body": "Call back", "meta": {"pinned": true}})))
        .respond_with(ResponseTemplate::new(201).set_body_json(envelope(json!({"id": 3}))))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, fresh_credentials());
    let body = json!({"body": "Call back", "matter_id": null, "meta": {"pinned": true, "tag": null}});
    let created: Value = client.post("/notes", &body).await.unwrap();
    assert_eq!(created["id"], 3);
}

#[tokio::test]
async fn test_post_not_retried_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server);
    config.api.retry_non_idempotent = false;
    let client = lm_api::ApiClient::new(&config, fresh_credentials()).unwrap();
    let err = client
        .post::<_, Value>("/contacts", &json!({"first_name": "Ada"}))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_post_with_idempotency_key_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("idempotency-key", "create-ada"))
        .respond_with(ResponseTemplate::new(201).set_body_json(envelope(contact_json(7))))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server);
    config.api.retry_non_idempotent = false;
    let client = lm_api::ApiClient::new(&config, fresh_credentials()).unwrap();
    let input = lm_models::ContactInput {
        first_name: Some("Ada".into()),
        ..Default::default()
    };
    let contact = client
        .contacts()
        .create_idempotent(&input, "create-ada")
        .await
        .unwrap();
    assert_eq!(contact.id, 7);
}

#[tokio::test]
async fn test_cancellation_stops_in_flight_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(contact_json(1)))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = create_test_client(&server, fresh_credentials());
    let token = CancellationToken::new();
    let request = RequestDescriptor::get("/contacts/1").cancel_with(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    });

    let started = Instant::now();
    let result = client.send::<Contact>(request).await;
    canceller.await.unwrap();
    assert!(matches!(result, Err(LmError::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_cancellation_during_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, fresh_credentials());
    let token = CancellationToken::new();
    let request = RequestDescriptor::get("/contacts").cancel_with(token.clone());
    let handle = tokio::spawn(async move { client.send::<Value>(request).await });

    tokio::time::sleep(Duration::from_millis(200)).await;
    token.cancel();
    let result = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("cancelled call should return promptly")
        .unwrap();
    assert!(matches!(result, Err(LmError::Cancelled)));
}

#[tokio::test]
async fn test_already_cancelled_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = create_test_client(&server, fresh_credentials());
    let token = CancellationToken::new();
    token.cancel();
    let result = client
        .send::<Value>(RequestDescriptor::get("/contacts").cancel_with(token))
        .await;
    assert!(matches!(result, Err(LmError::Cancelled)));
}

#[tokio::test]
async fn test_timeout_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server);
    config.api.timeout_secs = 1;
    config.api.max_retry_attempts = 0;
    let client = lm_api::ApiClient::new(&config, fresh_credentials()).unwrap();
    let err = client.get::<Value>("/contacts").await.unwrap_err();
    assert!(matches!(err, LmError::Api(_)));
    assert_eq!(err.status(), None);
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_timed_out_attempt_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/contacts/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(contact_json(1)))
                .set_delay(Duration::from_secs(3)),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/contacts/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(contact_json(1))))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server);
    config.api.timeout_secs = 1;
    config.api.max_retry_attempts = 2;
    let client = lm_api::ApiClient::new(&config, fresh_credentials()).unwrap();

    let started = Instant::now();
    let contact: Contact = client.get("/contacts/1").await.unwrap();
    assert_eq!(contact.id, 1);
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}
