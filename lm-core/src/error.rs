//! Error types for the LawMatics SDK.
//!
//! Every API call resolves to either a decoded value or an `LmError`.
//! Network and HTTP failures are classified once, at the request pipeline
//! boundary, into the variants below; local validation failures
//! (`InvalidCredential`, `InvalidConfiguration`) never touch the network.

use std::fmt;
use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;

/// Convenience type alias for Results using LmError.
pub type LmResult<T> = Result<T, LmError>;

/// Structured context carried by every error that came back from the API
/// (or failed to reach it).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApiFailure {
    /// HTTP status code. `None` for transport failures (connect, timeout).
    pub status: Option<u16>,
    /// Human-readable message. Always present.
    pub message: String,
    /// API-supplied error code, when the error body carried one.
    pub code: Option<String>,
    /// Correlation id for support requests.
    pub correlation_id: Option<String>,
    /// Structured details parsed from the error body. Only populated when
    /// `include_error_details` is enabled.
    pub details: Option<Map<String, Value>>,
}

impl ApiFailure {
    /// Failure for an HTTP response with the given status.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            ..Default::default()
        }
    }

    /// Failure for a request that never produced an HTTP response.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_code(mut self, code: Option<String>) -> Self {
        self.code = code;
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: Option<String>) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    pub fn with_details(mut self, details: Option<Map<String, Value>>) -> Self {
        self.details = details;
        self
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "status {status}: {}", self.message)?,
            None => write!(f, "{}", self.message)?,
        }
        if let Some(ref code) = self.code {
            write!(f, " (code {code})")?;
        }
        if let Some(ref id) = self.correlation_id {
            write!(f, " [correlation id {id}]")?;
        }
        Ok(())
    }
}

/// Unified error type for the SDK.
#[derive(Error, Debug)]
pub enum LmError {
    // -- API errors --
    /// 401 from the API, or a failed token refresh.
    #[error("authentication failed: {0}")]
    Authentication(ApiFailure),

    /// 404 from the API.
    #[error("not found: {failure}")]
    NotFound {
        failure: ApiFailure,
        /// Resource type from the request path, e.g. "contacts".
        resource_type: Option<String>,
        /// Requested resource id, when the id was part of the path.
        resource_id: Option<String>,
    },

    /// 429 from the API.
    #[error("rate limit exceeded: {failure}")]
    RateLimited {
        failure: ApiFailure,
        /// Delay requested by the `Retry-After` header.
        retry_after: Option<Duration>,
    },

    /// Any other API or transport failure. Transient when the status is
    /// absent (network, timeout) or 5xx.
    #[error("api error: {0}")]
    Api(ApiFailure),

    // -- Local validation errors --
    /// A required credential was missing or empty.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// Client configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    // -- Local processing errors --
    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,

    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LmError {
    /// Authentication error without an HTTP response behind it.
    pub fn authentication(message: impl Into<String>) -> Self {
        LmError::Authentication(ApiFailure::new(401, message))
    }

    /// The structured API context, if this error came from the API.
    pub fn failure(&self) -> Option<&ApiFailure> {
        match self {
            LmError::Authentication(f) | LmError::Api(f) => Some(f),
            LmError::NotFound { failure, .. } | LmError::RateLimited { failure, .. } => {
                Some(failure)
            }
            _ => None,
        }
    }

    /// HTTP status code, if any.
    pub fn status(&self) -> Option<u16> {
        self.failure().and_then(|f| f.status)
    }

    /// Correlation id, if the API supplied one.
    pub fn correlation_id(&self) -> Option<&str> {
        self.failure().and_then(|f| f.correlation_id.as_deref())
    }

    /// Whether the pipeline may retry the call that produced this error.
    pub fn is_transient(&self) -> bool {
        match self {
            LmError::RateLimited { .. } => true,
            LmError::Api(f) => match f.status {
                None => true,
                Some(status) => status >= 500,
            },
            _ => false,
        }
    }

    /// Server-requested delay before retrying.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LmError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for LmError {
    fn from(e: serde_json::Error) -> Self {
        LmError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for LmError {
    fn from(e: toml::de::Error) -> Self {
        LmError::InvalidConfiguration(e.to_string())
    }
}
