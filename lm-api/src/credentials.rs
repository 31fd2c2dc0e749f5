//! OAuth credentials and the store the request pipeline reads them from.
//!
//! `Credentials` is plain data with the staleness rule. `CredentialStore`
//! is the single owner of the live credentials for an `ApiClient`: reads
//! go through snapshots, writes only through `update_token`/`replace`, and
//! every write bumps a generation counter so concurrent callers can tell
//! whether a refresh already happened while they were waiting.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};

use lm_core::constants;
use lm_core::error::{ApiFailure, LmError, LmResult};

/// Access/refresh token pair plus the metadata needed to refresh it.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    access_token: String,
    refresh_token: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    token_type: String,
}

impl Credentials {
    /// Create credentials from an access token. Fails on an empty token.
    pub fn new(access_token: impl Into<String>) -> LmResult<Self> {
        let access_token = access_token.into();
        require_token(&access_token)?;
        Ok(Self {
            access_token,
            refresh_token: None,
            client_id: None,
            client_secret: None,
            expires_at: None,
            token_type: constants::DEFAULT_TOKEN_TYPE.to_string(),
        })
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        let token = refresh_token.into();
        self.refresh_token = (!token.is_empty()).then_some(token);
        self
    }

    /// OAuth application credentials sent along with refresh requests.
    pub fn with_client(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Expiry relative to now.
    pub fn with_expires_in(mut self, seconds: i64) -> Self {
        self.expires_at = Some(expiry_after(seconds));
        self
    }

    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        let token_type = token_type.into();
        if !token_type.trim().is_empty() {
            self.token_type = token_type;
        }
        self
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Value for the `Authorization` header, e.g. "Bearer abc123".
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    /// Whether the token should be treated as expired now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Expired once `now` is within the refresh margin of the expiry.
    /// Credentials without an expiry never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let margin = Duration::seconds(constants::TOKEN_REFRESH_MARGIN_SECS);
                now >= expires_at.checked_sub_signed(margin).unwrap_or(expires_at)
            }
            None => false,
        }
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Replace the access token after a refresh.
    ///
    /// The refresh token is only replaced when a non-empty one is supplied,
    /// and the expiry is only recomputed when `expires_in_secs` is given.
    /// Lifetimes beyond the representable range saturate.
    pub fn update_token(
        &mut self,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_in_secs: Option<i64>,
    ) -> LmResult<()> {
        require_token(access_token)?;
        self.access_token = access_token.to_string();
        if let Some(refresh) = refresh_token.filter(|t| !t.is_empty()) {
            self.refresh_token = Some(refresh.to_string());
        }
        if let Some(seconds) = expires_in_secs {
            self.expires_at = Some(expiry_after(seconds));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// `seconds` from now, clamped to the range chrono can represent.
fn expiry_after(seconds: i64) -> DateTime<Utc> {
    Duration::try_seconds(seconds)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        .unwrap_or(if seconds < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}

fn require_token(token: &str) -> LmResult<()> {
    if token.trim().is_empty() {
        return Err(LmError::InvalidCredential("access token must not be empty".into()));
    }
    Ok(())
}

/// Outcome of the most recent refresh attempt, guarded by the refresh mutex.
#[derive(Debug, Default)]
pub(crate) struct RefreshRecord {
    /// Generation the attempt was made for.
    pub attempted_for: Option<u64>,
    /// When the attempt finished.
    pub finished_at: Option<Instant>,
    /// Failure of that attempt, handed to callers that waited on it.
    pub failure: Option<ApiFailure>,
}

struct StoreState {
    credentials: Credentials,
    generation: u64,
}

/// Live credentials shared by every request an `ApiClient` makes.
pub struct CredentialStore {
    state: RwLock<StoreState>,
    refresh_gate: Arc<Mutex<RefreshRecord>>,
}

impl CredentialStore {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            state: RwLock::new(StoreState {
                credentials,
                generation: 0,
            }),
            refresh_gate: Arc::new(Mutex::new(RefreshRecord::default())),
        }
    }

    /// Copy of the current credentials.
    pub async fn snapshot(&self) -> Credentials {
        self.state.read().await.credentials.clone()
    }

    /// Number of times the credentials have been updated or replaced.
    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    /// Authorization header value together with the generation it belongs to.
    pub async fn authorization(&self) -> (String, u64) {
        let state = self.state.read().await;
        (state.credentials.authorization_header(), state.generation)
    }

    /// Expired and refreshable.
    pub async fn needs_refresh(&self) -> bool {
        let state = self.state.read().await;
        state.credentials.is_expired() && state.credentials.has_refresh_token()
    }

    pub async fn has_refresh_token(&self) -> bool {
        self.state.read().await.credentials.has_refresh_token()
    }

    /// See [`Credentials::update_token`].
    pub async fn update_token(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_in_secs: Option<i64>,
    ) -> LmResult<()> {
        let mut state = self.state.write().await;
        state
            .credentials
            .update_token(access_token, refresh_token, expires_in_secs)?;
        state.generation += 1;
        Ok(())
    }

    /// Apply a token endpoint response, including a changed token type.
    pub(crate) async fn apply_token_response(
        &self,
        token: &crate::auth::TokenResponse,
    ) -> LmResult<()> {
        let mut state = self.state.write().await;
        state.credentials.update_token(
            &token.access_token,
            token.refresh_token.as_deref(),
            token.expires_in,
        )?;
        if let Some(token_type) = token.token_type.as_deref().filter(|t| !t.trim().is_empty()) {
            state.credentials.token_type = normalize_token_type(token_type);
        }
        state.generation += 1;
        Ok(())
    }

    /// Swap in a different set of credentials wholesale.
    pub async fn replace(&self, credentials: Credentials) {
        let mut state = self.state.write().await;
        state.credentials = credentials;
        state.generation += 1;
    }

    pub(crate) fn refresh_gate(&self) -> Arc<Mutex<RefreshRecord>> {
        Arc::clone(&self.refresh_gate)
    }
}

/// Token endpoints commonly return "bearer"; the header wants "Bearer".
pub(crate) fn normalize_token_type(token_type: &str) -> String {
    if token_type.eq_ignore_ascii_case("bearer") {
        constants::DEFAULT_TOKEN_TYPE.to_string()
    } else {
        token_type.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials::new("access-1").unwrap().with_refresh_token("refresh-1")
    }

    #[test]
    fn test_empty_access_token_rejected() {
        assert!(matches!(Credentials::new(""), Err(LmError::InvalidCredential(_))));
        assert!(matches!(Credentials::new("   "), Err(LmError::InvalidCredential(_))));
    }

    #[test]
    fn test_expiry_in_past_is_expired() {
        let now = Utc::now();
        let c = creds().with_expires_at(now - Duration::seconds(1));
        assert!(c.is_expired_at(now));
        let c = creds().with_expires_at(now - Duration::days(3));
        assert!(c.is_expired_at(now));
    }

    #[test]
    fn test_expiry_outside_margin_is_fresh() {
        let now = Utc::now();
        let c = creds().with_expires_at(now + Duration::minutes(10));
        assert!(!c.is_expired_at(now));
    }

    #[test]
    fn test_expiry_inside_margin_is_expired() {
        let now = Utc::now();
        let c = creds().with_expires_at(now + Duration::minutes(4));
        assert!(c.is_expired_at(now));
        let c = creds().with_expires_at(now + Duration::minutes(5));
        assert!(c.is_expired_at(now));
    }

    #[test]
    fn test_no_expiry_never_expires() {
        assert!(!creds().is_expired());
    }

    #[test]
    fn test_has_refresh_token() {
        assert!(creds().has_refresh_token());
        assert!(!Credentials::new("a").unwrap().has_refresh_token());
        assert!(!Credentials::new("a").unwrap().with_refresh_token("").has_refresh_token());
    }

    #[test]
    fn test_update_token_keeps_refresh_on_empty() {
        let mut c = creds();
        c.update_token("access-2", Some(""), None).unwrap();
        assert_eq!(c.access_token(), "access-2");
        assert_eq!(c.refresh_token(), Some("refresh-1"));
        assert!(c.expires_at().is_none());

        c.update_token("access-3", None, None).unwrap();
        assert_eq!(c.refresh_token(), Some("refresh-1"));
    }

    #[test]
    fn test_update_token_sets_refresh_and_expiry() {
        let mut c = creds();
        let before = Utc::now();
        c.update_token("access-2", Some("new-refresh"), Some(3600)).unwrap();
        let expires_at = c.expires_at().unwrap();
        assert_eq!(c.refresh_token(), Some("new-refresh"));
        let delta = (expires_at - before).num_seconds();
        assert!((3599..=3601).contains(&delta), "unexpected expiry delta {delta}");
    }

    #[test]
    fn test_update_token_saturates_huge_lifetime() {
        let mut c = creds();
        c.update_token("access-2", None, Some(i64::MAX)).unwrap();
        assert_eq!(c.expires_at(), Some(DateTime::<Utc>::MAX_UTC));
        assert!(!c.is_expired());

        c.update_token("access-3", None, Some(i64::MIN)).unwrap();
        assert_eq!(c.expires_at(), Some(DateTime::<Utc>::MIN_UTC));
        assert!(c.is_expired());
    }

    #[test]
    fn test_with_expires_in_saturates() {
        let far = creds().with_expires_in(i64::MAX);
        assert_eq!(far.expires_at(), Some(DateTime::<Utc>::MAX_UTC));
        assert!(!far.is_expired_at(Utc::now()));

        let past = creds().with_expires_in(i64::MIN);
        assert!(past.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_update_token_rejects_empty_access() {
        let mut c = creds();
        assert!(matches!(
            c.update_token("", Some("r"), None),
            Err(LmError::InvalidCredential(_))
        ));
        assert_eq!(c.access_token(), "access-1");
    }

    #[test]
    fn test_authorization_header_and_debug_redaction() {
        let c = creds().with_client("client", "shh").with_token_type("Token");
        assert_eq!(c.authorization_header(), "Token access-1");
        let debug = format!("{c:?}");
        assert!(!debug.contains("access-1"));
        assert!(!debug.contains("shh"));
        assert!(debug.contains("client"));
    }

    #[tokio::test]
    async fn test_store_generation_bumps_on_writes() {
        let store = CredentialStore::new(creds());
        assert_eq!(store.generation().await, 0);

        store.update_token("access-2", None, Some(60)).await.unwrap();
        assert_eq!(store.generation().await, 1);
        let (header, generation) = store.authorization().await;
        assert_eq!(header, "Bearer access-2");
        assert_eq!(generation, 1);

        store.replace(Credentials::new("other").unwrap()).await;
        assert_eq!(store.generation().await, 2);
        assert!(!store.has_refresh_token().await);
    }

    #[tokio::test]
    async fn test_store_failed_update_keeps_generation() {
        let store = CredentialStore::new(creds());
        assert!(store.update_token("", None, None).await.is_err());
        assert_eq!(store.generation().await, 0);
        assert_eq!(store.snapshot().await.access_token(), "access-1");
    }

    #[tokio::test]
    async fn test_store_needs_refresh() {
        let expired = creds().with_expires_in(-10);
        assert!(CredentialStore::new(expired.clone()).needs_refresh().await);

        let no_refresh = Credentials::new("a").unwrap().with_expires_in(-10);
        assert!(!CredentialStore::new(no_refresh).needs_refresh().await);

        let fresh = creds().with_expires_in(3600);
        assert!(!CredentialStore::new(fresh).needs_refresh().await);
    }

    #[test]
    fn test_normalize_token_type() {
        assert_eq!(normalize_token_type("bearer"), "Bearer");
        assert_eq!(normalize_token_type("MAC"), "MAC");
    }
}
