//! OAuth token handling.
//!
//! `OAuthClient` talks to the token endpoint (authorization-code exchange
//! and refresh grants). `TokenRefresher` binds it to a `CredentialStore`
//! and makes refresh single-flight: however many requests notice an
//! expired token at the same moment, one token request is made and every
//! waiter reuses its outcome.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, info, warn};

use lm_core::config::OAuthConfig;
use lm_core::error::{ApiFailure, LmError, LmResult};

use crate::credentials::{normalize_token_type, CredentialStore, Credentials};
use crate::response::ErrorPayload;

/// Token endpoint response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Client for the OAuth authorization and token endpoints.
#[derive(Clone)]
pub struct OAuthClient {
    http: Client,
    config: OAuthConfig,
    client_id: Option<String>,
    client_secret: Option<String>,
    timeout: Duration,
}

impl OAuthClient {
    pub fn new(
        http: Client,
        config: OAuthConfig,
        client_id: Option<String>,
        client_secret: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            config,
            client_id,
            client_secret,
            timeout,
        }
    }

    /// URL to send the user to for consent.
    pub fn authorization_url(&self, state: &str) -> LmResult<String> {
        let client_id = self.client_id.as_deref().ok_or_else(|| {
            LmError::InvalidConfiguration("client id is required for authorization".into())
        })?;
        let redirect_uri = self.config.redirect_uri.as_deref().ok_or_else(|| {
            LmError::InvalidConfiguration("oauth.redirect_uri is required for authorization".into())
        })?;

        let mut params = vec![
            ("response_type", "code".to_string()),
            ("client_id", client_id.to_string()),
            ("redirect_uri", redirect_uri.to_string()),
        ];
        if !self.config.scopes.is_empty() {
            params.push(("scope", self.config.scopes.join(" ")));
        }
        if !state.is_empty() {
            params.push(("state", state.to_string()));
        }

        let url = Url::parse_with_params(&self.config.authorization_url, &params).map_err(|e| {
            LmError::InvalidConfiguration(format!("invalid authorization url: {e}"))
        })?;
        Ok(url.into())
    }

    /// Exchange an authorization code for a fresh set of credentials.
    pub async fn exchange_code(&self, code: &str) -> LmResult<Credentials> {
        if code.trim().is_empty() {
            return Err(LmError::InvalidCredential(
                "authorization code must not be empty".into(),
            ));
        }
        let redirect_uri = self.config.redirect_uri.clone().unwrap_or_default();
        let mut form = vec![
            ("grant_type", "authorization_code".to_string()),
            ("code", code.to_string()),
            ("redirect_uri", redirect_uri),
        ];
        self.push_client_fields(&mut form, None, None);

        let token = self.request_token(&form).await?;
        let mut credentials = Credentials::new(token.access_token.clone())?;
        if let Some(ref refresh) = token.refresh_token {
            credentials = credentials.with_refresh_token(refresh.clone());
        }
        if let (Some(id), Some(secret)) = (&self.client_id, &self.client_secret) {
            credentials = credentials.with_client(id.clone(), secret.clone());
        }
        if let Some(seconds) = token.expires_in {
            credentials = credentials.with_expires_in(seconds);
        }
        if let Some(ref token_type) = token.token_type {
            credentials = credentials.with_token_type(normalize_token_type(token_type));
        }
        info!("authorization code exchanged for access token");
        Ok(credentials)
    }

    /// Run the refresh-token grant. Client id/secret from the credentials
    /// take precedence over the ones this client was built with.
    pub async fn refresh_grant(
        &self,
        refresh_token: &str,
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> LmResult<TokenResponse> {
        let mut form = vec![
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", refresh_token.to_string()),
        ];
        self.push_client_fields(&mut form, client_id, client_secret);
        self.request_token(&form).await
    }

    fn push_client_fields(
        &self,
        form: &mut Vec<(&'static str, String)>,
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) {
        if let Some(id) = client_id.or(self.client_id.as_deref()) {
            form.push(("client_id", id.to_string()));
        }
        if let Some(secret) = client_secret.or(self.client_secret.as_deref()) {
            form.push(("client_secret", secret.to_string()));
        }
    }

    /// POST a form to the token endpoint. Every failure is an
    /// `Authentication` error.
    async fn request_token(&self, form: &[(&'static str, String)]) -> LmResult<TokenResponse> {
        debug!("POST {}", self.config.token_url);

        let response = self
            .http
            .post(&self.config.token_url)
            .timeout(self.timeout)
            .form(form)
            .send()
            .await
            .map_err(|e| {
                LmError::Authentication(ApiFailure::transport(format!(
                    "token request failed: {e}"
                )))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            LmError::Authentication(ApiFailure::transport(format!(
                "failed to read token response: {e}"
            )))
        })?;

        if !status.is_success() {
            let payload = ErrorPayload::parse(&body);
            let message = payload
                .message
                .unwrap_or_else(|| format!("token endpoint returned {status}"));
            warn!("token request rejected with {status}");
            return Err(LmError::Authentication(
                ApiFailure::new(status.as_u16(), message).with_code(payload.code),
            ));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            LmError::Authentication(ApiFailure::new(
                status.as_u16(),
                format!("malformed token response: {e}"),
            ))
        })?;
        if token.access_token.trim().is_empty() {
            return Err(LmError::Authentication(ApiFailure::new(
                status.as_u16(),
                "token response did not contain an access token",
            )));
        }
        Ok(token)
    }
}

/// Refreshes the credentials in a `CredentialStore`.
#[derive(Clone)]
pub struct TokenRefresher {
    oauth: OAuthClient,
    credentials: Arc<CredentialStore>,
}

impl TokenRefresher {
    pub fn new(oauth: OAuthClient, credentials: Arc<CredentialStore>) -> Self {
        Self { oauth, credentials }
    }

    /// Refresh unconditionally and store the new token.
    pub async fn refresh(&self) -> LmResult<()> {
        let current = self.credentials.snapshot().await;
        let refresh_token = current
            .refresh_token()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| LmError::authentication("no refresh token available"))?;

        let token = self
            .oauth
            .refresh_grant(refresh_token, current.client_id(), current.client_secret())
            .await?;

        self.credentials
            .apply_token_response(&token)
            .await
            .map_err(|e| LmError::authentication(format!("refreshed token rejected: {e}")))?;

        info!(
            "access token refreshed (expires in {})",
            token
                .expires_in
                .map(|s| format!("{s}s"))
                .unwrap_or_else(|| "unknown".into())
        );
        Ok(())
    }

    /// Refresh on behalf of a caller that saw credentials at `observed`
    /// generation.
    ///
    /// Callers queue on the refresh mutex. Whoever gets it first and still
    /// sees `observed` performs the refresh in a spawned task that owns the
    /// guard, so cancelling that caller does not abort the refresh the
    /// others wait on. Later callers see a newer generation and return, or
    /// receive the recorded failure of the attempt they waited behind.
    /// With `force` unset the refresh only happens if the token is still
    /// expired.
    pub async fn refresh_shared(&self, observed: u64, force: bool) -> LmResult<()> {
        let requested_at = Instant::now();
        let mut gate = self.credentials.refresh_gate().lock_owned().await;

        let current = self.credentials.generation().await;
        if current != observed {
            debug!("credentials changed while waiting, skipping refresh");
            return Ok(());
        }
        let waited_on_attempt = gate.attempted_for == Some(current)
            && gate.finished_at.is_some_and(|t| t >= requested_at);
        if waited_on_attempt {
            if let Some(ref failure) = gate.failure {
                return Err(LmError::Authentication(failure.clone()));
            }
            return Ok(());
        }
        if !force && !self.credentials.needs_refresh().await {
            return Ok(());
        }

        let refresher = self.clone();
        let task = tokio::spawn(async move {
            let result = refresher.refresh().await;
            gate.attempted_for = Some(current);
            gate.finished_at = Some(Instant::now());
            gate.failure = result.as_ref().err().map(|e| match e {
                LmError::Authentication(failure) => failure.clone(),
                other => ApiFailure::new(401, other.to_string()),
            });
            drop(gate);
            result
        });

        task.await
            .map_err(|e| LmError::authentication(format!("token refresh task failed: {e}")))?
    }
}
