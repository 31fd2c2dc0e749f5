//! SDK-wide constants.

/// SDK name, used in the default user agent.
pub const SDK_NAME: &str = "lawmatics-sdk-rust";

/// SDK version.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default REST API host.
pub const DEFAULT_BASE_URL: &str = "https://api.lawmatics.com";

/// REST API version path segment.
pub const API_VERSION: &str = "v1";

/// Default OAuth authorization endpoint.
pub const DEFAULT_AUTHORIZATION_URL: &str = "https://app.lawmatics.com/oauth/authorize";

/// Default OAuth token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://api.lawmatics.com/oauth/token";

/// Default per-attempt request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of additional attempts for transient failures.
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 3;

/// Default delay between retry attempts in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

/// Upper bound for exponential backoff in milliseconds.
pub const DEFAULT_MAX_RETRY_DELAY_MS: u64 = 30_000;

/// Access tokens are treated as expired this many seconds before their
/// actual expiry.
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 300;

/// Default token type for the Authorization header.
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Header names read from or written to the wire.
pub mod headers {
    pub const REQUEST_ID: &str = "X-Request-Id";
    pub const CORRELATION_ID: &str = "X-Correlation-Id";
    pub const RETRY_AFTER: &str = "Retry-After";
    pub const IDEMPOTENCY_KEY: &str = "Idempotency-Key";
}

/// Default user agent string, e.g. `lawmatics-sdk-rust/0.1.0`.
pub fn default_user_agent() -> String {
    format!("{SDK_NAME}/{SDK_VERSION}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_user_agent() {
        let ua = default_user_agent();
        assert!(ua.starts_with("lawmatics-sdk-rust/"));
        assert!(ua.ends_with(SDK_VERSION));
    }
}
