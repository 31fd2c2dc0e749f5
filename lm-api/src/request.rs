//! Request descriptors: everything the pipeline needs to make one call.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use lm_core::constants::headers;
use lm_core::error::{LmError, LmResult};

/// The resource a request addresses, reported back on `NotFound`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    /// Resource type as it appears in the path, e.g. "contacts".
    pub kind: String,
    pub id: String,
}

impl ResourceRef {
    pub fn new(kind: impl Into<String>, id: impl ToString) -> Self {
        Self {
            kind: kind.into(),
            id: id.to_string(),
        }
    }

    /// Infer `(type, id)` from a path whose last segment looks like an id,
    /// e.g. `/matters/100/notes/7` -> ("notes", "7").
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split('?').next().unwrap_or(path);
        let mut segments = path.rsplit('/').filter(|s| !s.is_empty());
        let id = segments.next()?;
        let kind = segments.next()?;
        if !id.chars().any(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(Self::new(kind, id))
    }
}

/// One API call: verb, path, body, query, and cancellation.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    body: Option<Value>,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    resource: Option<ResourceRef>,
    cancel: CancellationToken,
}

impl RequestDescriptor {
    /// `path` is relative to the versioned API root, e.g. "/contacts/42".
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        Self {
            method,
            path,
            body: None,
            query: Vec::new(),
            headers: Vec::new(),
            resource: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body. Null members are dropped before sending.
    pub fn json<B: Serialize + ?Sized>(self, body: &B) -> LmResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| LmError::Serialization(format!("failed to serialize body: {e}")))?;
        Ok(self.json_value(value))
    }

    /// Attach an untyped JSON body. Null members are dropped before sending.
    pub fn json_value(mut self, body: Value) -> Self {
        self.body = Some(strip_nulls(body));
        self
    }

    /// Append a query parameter. Order is preserved.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn query_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.to_string())));
        self
    }

    /// Per-request header, sent in addition to the configured ones.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Mark a POST/PATCH as safe to retry.
    pub fn idempotency_key(self, key: impl Into<String>) -> Self {
        self.header(headers::IDEMPOTENCY_KEY, key)
    }

    /// Name the resource this request addresses.
    pub fn resource(mut self, kind: impl Into<String>, id: impl ToString) -> Self {
        self.resource = Some(ResourceRef::new(kind, id));
        self
    }

    /// Use a caller-owned cancellation token.
    pub fn cancel_with(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Explicit resource, or one inferred from the path.
    pub fn resource_ref(&self) -> Option<ResourceRef> {
        self.resource
            .clone()
            .or_else(|| ResourceRef::from_path(&self.path))
    }

    pub fn has_idempotency_key(&self) -> bool {
        self.headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case(headers::IDEMPOTENCY_KEY))
    }

    /// POST and PATCH are not idempotent unless they carry a key.
    pub fn is_idempotent(&self) -> bool {
        let safe_verb = !matches!(self.method, Method::POST | Method::PATCH);
        safe_verb || self.has_idempotency_key()
    }
}

/// Remove `null` members from objects, recursively. Nulls inside arrays are
/// kept since their position carries meaning.
pub fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}
