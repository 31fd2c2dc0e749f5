//! Response envelope types.
//!
//! Every LawMatics response body is wrapped in an envelope:
//! ```json
//! { "data": { ... } }
//! { "data": [ ... ], "pagination": { "current_page": 1, "per_page": 25, ... } }
//! ```
//! Error bodies are not enveloped and are parsed by [`ErrorPayload`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Standard response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Response payload (type varies by endpoint).
    pub data: T,
    /// Present on list endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationInfo>,
}

/// Pagination metadata from list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPagination")]
pub struct PaginationInfo {
    pub current_page: u32,
    pub per_page: u32,
    /// Total number of records across all pages.
    pub total: u64,
    pub total_pages: u32,
    pub has_next: bool,
}

/// Wire form; `has_next` and `total_pages` are derived when the server omits them.
#[derive(Deserialize)]
struct RawPagination {
    #[serde(default = "first_page")]
    current_page: u32,
    #[serde(default)]
    per_page: u32,
    #[serde(default)]
    total: u64,
    #[serde(default)]
    total_pages: Option<u32>,
    #[serde(default)]
    has_next: Option<bool>,
}

fn first_page() -> u32 {
    1
}

impl From<RawPagination> for PaginationInfo {
    fn from(raw: RawPagination) -> Self {
        let total_pages = raw
            .total_pages
            .unwrap_or_else(|| page_count(raw.total, raw.per_page));
        Self {
            current_page: raw.current_page,
            per_page: raw.per_page,
            total: raw.total,
            total_pages,
            has_next: raw.has_next.unwrap_or(raw.current_page < total_pages),
        }
    }
}

impl PaginationInfo {
    /// Build pagination from page position and totals.
    pub fn new(current_page: u32, per_page: u32, total: u64) -> Self {
        let total_pages = page_count(total, per_page);
        Self {
            current_page,
            per_page,
            total,
            total_pages,
            has_next: current_page < total_pages,
        }
    }

    /// The page after this one, if there is one.
    pub fn next_page(&self) -> Option<u32> {
        self.has_next.then(|| self.current_page + 1)
    }
}

fn page_count(total: u64, per_page: u32) -> u32 {
    if per_page == 0 {
        return 0;
    }
    u32::try_from(total.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX)
}

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Option<PaginationInfo>,
}

impl<T> Page<T> {
    /// Whether another page can be requested.
    pub fn has_next(&self) -> bool {
        self.pagination.is_some_and(|p| p.has_next)
    }

    pub fn next_page(&self) -> Option<u32> {
        self.pagination.and_then(|p| p.next_page())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> From<ApiResponse<Vec<T>>> for Page<T> {
    fn from(resp: ApiResponse<Vec<T>>) -> Self {
        Self {
            items: resp.data,
            pagination: resp.pagination,
        }
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Fields extracted from an error response body.
///
/// Accepts the nested form `{"error": {"code", "message", "details"}}`,
/// the flat form `{"message", "code", "errors"}` and the OAuth form
/// `{"error": "invalid_grant", "error_description": "..."}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorPayload {
    pub message: Option<String>,
    pub code: Option<String>,
    pub details: Option<Map<String, Value>>,
}

impl ErrorPayload {
    pub fn parse(body: &str) -> Self {
        let Ok(Value::Object(root)) = serde_json::from_str::<Value>(body) else {
            return Self::default();
        };

        let nested = match root.get("error") {
            Some(Value::Object(inner)) => Some(inner),
            _ => None,
        };
        let source = nested.unwrap_or(&root);

        let message = string_field(source, "message")
            .or_else(|| string_field(&root, "error_description"))
            .or_else(|| joined_errors(source.get("errors")));

        let code = string_field(source, "code").or_else(|| match root.get("error") {
            Some(Value::String(code)) => Some(code.clone()),
            _ => None,
        });

        let details = match source.get("details").or_else(|| source.get("errors")) {
            Some(Value::Object(map)) => Some(map.clone()),
            Some(Value::Array(items)) => {
                let mut map = Map::new();
                map.insert("errors".into(), Value::Array(items.clone()));
                Some(map)
            }
            _ => None,
        };

        Self {
            message,
            code,
            details,
        }
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn joined_errors(errors: Option<&Value>) -> Option<String> {
    let items = errors?.as_array()?;
    let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
    (!parts.is_empty()).then(|| parts.join("; "))
}
