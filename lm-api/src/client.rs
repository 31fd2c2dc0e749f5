//! HTTP client for the LawMatics REST API.
//!
//! Every resource call goes through [`ApiClient::execute`]: credential
//! injection, proactive token refresh, per-attempt timeout, retry on
//! transient failures, and classification of failed responses into
//! [`LmError`] variants. Nothing from `reqwest` leaks past this module.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use lm_core::config::{ApiConfig, BackoffStrategy, SdkConfig};
use lm_core::constants::headers;
use lm_core::error::{ApiFailure, LmError, LmResult};

use crate::auth::{OAuthClient, TokenRefresher};
use crate::credentials::{CredentialStore, Credentials};
use crate::request::RequestDescriptor;
use crate::response::{ApiResponse, ErrorPayload, Page};

/// Retry configuration for HTTP requests.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Whether transient failures are retried at all.
    pub enabled: bool,
    /// Maximum number of retry attempts after the first try.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Maximum delay cap for exponential backoff.
    pub max_delay: Duration,
    /// Fixed or exponential growth.
    pub backoff: BackoffStrategy,
    /// Retry POST/PATCH requests without an idempotency key.
    pub retry_non_idempotent: bool,
}

impl RetryConfig {
    pub fn from_config(api: &ApiConfig) -> Self {
        Self {
            enabled: api.enable_retry,
            max_retries: api.max_retry_attempts,
            base_delay: api.retry_delay(),
            max_delay: Duration::from_millis(api.max_retry_delay_ms),
            backoff: api.backoff,
            retry_non_idempotent: api.retry_non_idempotent,
        }
    }

    /// Number of retries allowed for this request.
    fn retries_for(&self, request: &RequestDescriptor) -> u32 {
        if !self.enabled {
            return 0;
        }
        if request.is_idempotent() || self.retry_non_idempotent {
            self.max_retries
        } else {
            0
        }
    }

    /// Delay before retry number `attempt` (0-based).
    fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            BackoffStrategy::Fixed => self.base_delay,
            BackoffStrategy::Exponential => {
                let base_ms = self.base_delay.as_millis() as u64;
                let delay_ms = base_ms.saturating_mul(1u64 << attempt.min(32));
                let max_ms = self.max_delay.as_millis() as u64;
                Duration::from_millis(delay_ms.min(max_ms))
            }
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from_config(&ApiConfig::default())
    }
}

/// A successful (2xx) response, body fully read.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// 204/205, or an empty body.
    pub fn is_no_content(&self) -> bool {
        self.status == StatusCode::NO_CONTENT
            || self.status == StatusCode::RESET_CONTENT
            || self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// Decode `{"data": ...}` and return the payload. A no-content response
    /// decodes from `null` without parsing the body, so it succeeds for
    /// `()`, `Option<_>` and `serde_json::Value`.
    pub fn into_data<T: DeserializeOwned>(self) -> LmResult<T> {
        if self.is_no_content() {
            return serde_json::from_value(serde_json::Value::Null).map_err(|_| {
                LmError::Serialization(format!(
                    "response {} had no content to decode",
                    self.status.as_u16()
                ))
            });
        }
        let envelope: ApiResponse<T> = serde_json::from_slice(&self.body)
            .map_err(|e| LmError::Serialization(format!("failed to parse response: {e}")))?;
        Ok(envelope.data)
    }

    /// Decode a list envelope, keeping pagination.
    pub fn into_page<T: DeserializeOwned>(self) -> LmResult<Page<T>> {
        if self.is_no_content() {
            return Ok(Page {
                items: Vec::new(),
                pagination: None,
            });
        }
        let envelope: ApiResponse<Vec<T>> = serde_json::from_slice(&self.body)
            .map_err(|e| LmError::Serialization(format!("failed to parse response: {e}")))?;
        Ok(envelope.into())
    }
}

/// HTTP client for communicating with the LawMatics API.
///
/// Cheap to clone; clones share credentials and the connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Client,
    /// Versioned API root, e.g. "https://api.lawmatics.com/v1".
    api_root: String,
    /// Per-attempt timeout.
    timeout: Duration,
    /// Custom headers from config, validated at construction.
    custom_headers: Vec<(HeaderName, HeaderValue)>,
    include_error_details: bool,
    retry_config: RetryConfig,
    credentials: Arc<CredentialStore>,
    oauth: OAuthClient,
    refresher: TokenRefresher,
}

impl ApiClient {
    /// Create a new ApiClient from SDK configuration and initial credentials.
    pub fn new(config: &SdkConfig, credentials: Credentials) -> LmResult<Self> {
        config.validate()?;

        let inner = Client::builder()
            .user_agent(config.api.user_agent.clone())
            .connect_timeout(Duration::from_secs(15))
            .pool_max_idle_per_host(8)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                LmError::InvalidConfiguration(format!("failed to build HTTP client: {e}"))
            })?;

        let mut custom_headers = Vec::with_capacity(config.api.custom_headers.len());
        for (name, value) in &config.api.custom_headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                LmError::InvalidConfiguration(format!("invalid header name {name:?}: {e}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                LmError::InvalidConfiguration(format!("invalid value for header {name}: {e}"))
            })?;
            custom_headers.push((name, value));
        }

        let timeout = config.api.timeout();
        let oauth = OAuthClient::new(
            inner.clone(),
            config.oauth.clone(),
            credentials.client_id().map(String::from),
            credentials.client_secret().map(String::from),
            timeout,
        );
        let credentials = Arc::new(CredentialStore::new(credentials));
        let refresher = TokenRefresher::new(oauth.clone(), Arc::clone(&credentials));

        Ok(Self {
            inner,
            api_root: config.api.api_root(),
            timeout,
            custom_headers,
            include_error_details: config.api.include_error_details,
            retry_config: RetryConfig::from_config(&config.api),
            credentials,
            oauth,
            refresher,
        })
    }

    /// Set custom retry configuration.
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Get the current API root URL.
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// OAuth helpers bound to this client's configuration.
    pub fn oauth(&self) -> &OAuthClient {
        &self.oauth
    }

    // --- Credentials ---

    /// Copy of the current credentials.
    pub async fn credentials(&self) -> Credentials {
        self.credentials.snapshot().await
    }

    /// Store a new access token obtained outside the SDK.
    pub async fn update_credentials(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_in_secs: Option<i64>,
    ) -> LmResult<()> {
        self.credentials
            .update_token(access_token, refresh_token, expires_in_secs)
            .await
    }

    /// Swap in a different set of credentials.
    pub async fn replace_credentials(&self, credentials: Credentials) {
        self.credentials.replace(credentials).await;
    }

    /// Refresh the access token now. Concurrent calls share one refresh.
    pub async fn refresh_token(&self) -> LmResult<()> {
        let observed = self.credentials.generation().await;
        self.refresher.refresh_shared(observed, true).await
    }

    // --- Request pipeline ---

    /// Send a request and decode the `data` member of the response envelope.
    pub async fn send<T: DeserializeOwned>(&self, request: RequestDescriptor) -> LmResult<T> {
        self.execute(&request).await?.into_data()
    }

    /// Send a request to a list endpoint.
    pub async fn send_page<T: DeserializeOwned>(
        &self,
        request: RequestDescriptor,
    ) -> LmResult<Page<T>> {
        self.execute(&request).await?.into_page()
    }

    /// Send a request whose success carries no payload of interest
    /// (typically DELETE). The body is never parsed.
    pub async fn send_no_content(&self, request: RequestDescriptor) -> LmResult<bool> {
        self.execute(&request).await?;
        Ok(true)
    }

    /// Run the full pipeline for one request and return the raw 2xx response.
    pub async fn execute(&self, request: &RequestDescriptor) -> LmResult<RawResponse> {
        let cancel = request.cancellation();
        if cancel.is_cancelled() {
            return Err(LmError::Cancelled);
        }

        if self.credentials.needs_refresh().await {
            let observed = self.credentials.generation().await;
            debug!("access token expired, refreshing before {}", request.path());
            self.await_refresh(observed, false, cancel).await?;
        }

        let url = self.url(request)?;
        let max_retries = self.retry_config.retries_for(request);
        let request_id = Uuid::new_v4().to_string();
        debug!("{} {} (request id {request_id})", request.method(), request.path());

        let mut attempt: u32 = 0;
        let mut refreshed_after_401 = false;

        loop {
            let (authorization, generation) = self.credentials.authorization().await;
            let builder = self.build_request(request, url.clone(), &authorization, &request_id);

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LmError::Cancelled),
                result = self.attempt(builder, request, &request_id) => result,
            };

            let err = match outcome {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            if matches!(err, LmError::Authentication(_))
                && !refreshed_after_401
                && self.credentials.has_refresh_token().await
            {
                refreshed_after_401 = true;
                warn!("{} {} returned 401, refreshing token", request.method(), request.path());
                self.await_refresh(generation, true, cancel).await?;
                continue;
            }

            if err.is_transient() && attempt < max_retries {
                let delay = err
                    .retry_after()
                    .unwrap_or_else(|| self.retry_config.delay_for(attempt));
                attempt += 1;
                warn!(
                    "retrying {} {} (attempt {}/{}) after {:.1}s: {}",
                    request.method(),
                    request.path(),
                    attempt + 1,
                    max_retries + 1,
                    delay.as_secs_f64(),
                    err
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(LmError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
                continue;
            }

            return Err(err);
        }
    }

    /// One HTTP attempt: send, read the body, classify.
    async fn attempt(
        &self,
        builder: RequestBuilder,
        request: &RequestDescriptor,
        request_id: &str,
    ) -> LmResult<RawResponse> {
        let response = builder.send().await.map_err(classify_transport)?;
        let status = response.status();
        let response_headers = response.headers().clone();
        let body = response.bytes().await.map_err(classify_transport)?.to_vec();

        if status.is_success() {
            return Ok(RawResponse {
                status,
                headers: response_headers,
                body,
            });
        }

        let err = classify_status(
            status,
            &response_headers,
            &body,
            request,
            request_id,
            self.include_error_details,
        );
        debug!("{} {} failed: {err}", request.method(), request.path());
        Err(err)
    }

    /// Wait for a shared refresh, giving up (without cancelling the
    /// refresh itself) if the caller cancels.
    async fn await_refresh(
        &self,
        observed: u64,
        force: bool,
        cancel: &CancellationToken,
    ) -> LmResult<()> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LmError::Cancelled),
            result = self.refresher.refresh_shared(observed, force) => result,
        }
    }

    /// Build the absolute URL for a request, including query parameters.
    fn url(&self, request: &RequestDescriptor) -> LmResult<Url> {
        let mut url = Url::parse(&format!("{}{}", self.api_root, request.path())).map_err(|e| {
            LmError::InvalidConfiguration(format!("invalid request url for {}: {e}", request.path()))
        })?;
        if !request.query_params().is_empty() {
            url.query_pairs_mut().extend_pairs(request.query_params());
        }
        Ok(url)
    }

    /// Apply custom headers to a request builder.
    fn apply_headers(&self, mut builder: RequestBuilder) -> RequestBuilder {
        for (key, value) in &self.custom_headers {
            builder = builder.header(key.clone(), value.clone());
        }
        builder
    }

    fn build_request(
        &self,
        request: &RequestDescriptor,
        url: Url,
        authorization: &str,
        request_id: &str,
    ) -> RequestBuilder {
        let mut builder = self
            .inner
            .request(request.method().clone(), url)
            .timeout(self.timeout)
            .header(AUTHORIZATION, authorization)
            .header(headers::REQUEST_ID, request_id);
        let overrides_accept = request
            .headers()
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(ACCEPT.as_str()));
        if !overrides_accept {
            builder = builder.header(ACCEPT, "application/json");
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }
        builder = self.apply_headers(builder);
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    // --- Public HTTP methods ---

    /// GET a single-entity endpoint.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> LmResult<T> {
        self.send(RequestDescriptor::get(path)).await
    }

    /// POST a JSON body.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> LmResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(RequestDescriptor::post(path).json(body)?).await
    }

    /// PUT a JSON body.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> LmResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(RequestDescriptor::put(path).json(body)?).await
    }

    /// PATCH a JSON body.
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> LmResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(RequestDescriptor::patch(path).json(body)?).await
    }

    /// Execute a DELETE request. Resolves to `true` on any 2xx.
    pub async fn delete(&self, path: &str) -> LmResult<bool> {
        self.send_no_content(RequestDescriptor::delete(path)).await
    }

    /// Download raw bytes (file contents are not enveloped).
    pub async fn download(&self, path: &str) -> LmResult<Vec<u8>> {
        let request = RequestDescriptor::get(path).header(ACCEPT.as_str(), "*/*");
        Ok(self.execute(&request).await?.body)
    }

    /// POST a multipart form (file uploads) described by `request`, which
    /// supplies the path, extra headers and cancellation token.
    ///
    /// A sent form is consumed, so `make_form` builds a fresh one per send.
    /// Transient failures are not retried. A 401 forces one token refresh
    /// and resends the form once.
    pub async fn post_multipart<T, F>(
        &self,
        request: &RequestDescriptor,
        make_form: F,
    ) -> LmResult<T>
    where
        T: DeserializeOwned,
        F: Fn() -> LmResult<reqwest::multipart::Form>,
    {
        let cancel = request.cancellation();
        if cancel.is_cancelled() {
            return Err(LmError::Cancelled);
        }
        if self.credentials.needs_refresh().await {
            let observed = self.credentials.generation().await;
            self.await_refresh(observed, false, cancel).await?;
        }

        let url = self.url(request)?;
        let request_id = Uuid::new_v4().to_string();
        debug!("POST (multipart) {} (request id {request_id})", request.path());

        let mut refreshed_after_401 = false;
        loop {
            let (authorization, generation) = self.credentials.authorization().await;
            let builder = self
                .build_request(request, url.clone(), &authorization, &request_id)
                .multipart(make_form()?);

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LmError::Cancelled),
                result = self.attempt(builder, request, &request_id) => result,
            };

            match outcome {
                Ok(response) => return response.into_data(),
                Err(LmError::Authentication(_))
                    if !refreshed_after_401 && self.credentials.has_refresh_token().await =>
                {
                    refreshed_after_401 = true;
                    warn!("POST (multipart) {} returned 401, refreshing token", request.path());
                    self.await_refresh(generation, true, cancel).await?;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Classify a reqwest error that never produced a response.
fn classify_transport(e: reqwest::Error) -> LmError {
    if e.is_builder() {
        LmError::InvalidConfiguration(format!("failed to build request: {e}"))
    } else if e.is_timeout() {
        LmError::Api(ApiFailure::transport(format!("request timed out: {e}")))
    } else if e.is_connect() {
        LmError::Api(ApiFailure::transport(format!("connection failed: {e}")))
    } else {
        LmError::Api(ApiFailure::transport(e.to_string()))
    }
}

/// Map a non-2xx response to the error taxonomy.
pub(crate) fn classify_status(
    status: StatusCode,
    response_headers: &HeaderMap,
    body: &[u8],
    request: &RequestDescriptor,
    request_id: &str,
    include_details: bool,
) -> LmError {
    let payload = ErrorPayload::parse(&String::from_utf8_lossy(body));
    let message = payload.message.unwrap_or_else(|| {
        status
            .canonical_reason()
            .map(String::from)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
    });
    let correlation_id = header_str(response_headers, headers::CORRELATION_ID)
        .or_else(|| header_str(response_headers, headers::REQUEST_ID))
        .unwrap_or_else(|| request_id.to_string());

    let failure = ApiFailure::new(status.as_u16(), message)
        .with_code(payload.code)
        .with_correlation_id(Some(correlation_id))
        .with_details(if include_details { payload.details } else { None });

    match status {
        StatusCode::UNAUTHORIZED => LmError::Authentication(failure),
        StatusCode::NOT_FOUND => {
            let resource = request.resource_ref();
            LmError::NotFound {
                failure,
                resource_type: resource.as_ref().map(|r| r.kind.clone()),
                resource_id: resource.map(|r| r.id),
            }
        }
        StatusCode::TOO_MANY_REQUESTS => LmError::RateLimited {
            failure,
            retry_after: header_str(response_headers, headers::RETRY_AFTER)
                .and_then(|v| parse_retry_after(&v, Utc::now())),
        },
        _ => LmError::Api(failure),
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// `Retry-After` is either delay-seconds or an HTTP date.
fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}
