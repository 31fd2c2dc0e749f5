//! Generic CRUD client for one LawMatics resource collection.
//!
//! Endpoint modules configure a [`ResourceClient`] with a base path and
//! add entity-specific finders on top.

use std::fmt;
use std::marker::PhantomData;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use lm_core::constants::DEFAULT_PAGE_SIZE;
use lm_core::error::LmResult;

use crate::client::ApiClient;
use crate::request::RequestDescriptor;
use crate::response::Page;

/// Paging and filtering for list calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Entity filters, sent in insertion order.
    pub filters: Vec<(String, String)>,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push((key.into(), value.to_string()));
        self
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::with_capacity(self.filters.len() + 2);
        if let Some(page) = self.page {
            query.push(("page".to_string(), page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            query.push(("page_size".to_string(), page_size.to_string()));
        }
        query.extend(self.filters.iter().cloned());
        query
    }
}

/// CRUD calls for entities of type `T`, created and updated with `I`.
pub struct ResourceClient<T, I = T> {
    client: ApiClient,
    path: String,
    _marker: PhantomData<fn() -> (T, I)>,
}

impl<T, I> Clone for ResourceClient<T, I> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            path: self.path.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T, I> fmt::Debug for ResourceClient<T, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceClient")
            .field("path", &self.path)
            .finish()
    }
}

impl<T, I> ResourceClient<T, I>
where
    T: DeserializeOwned,
    I: Serialize,
{
    /// `path` is the collection path, e.g. "/contacts".
    pub fn new(client: ApiClient, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = format!("/{}", path.trim_matches('/'));
        Self {
            client,
            path,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Resource type as reported on `NotFound`, i.e. the last path segment.
    pub fn kind(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Path of one entity. The id is percent-encoded as a single segment.
    fn item_path(&self, id: impl fmt::Display) -> String {
        format!("{}/{}", self.path, encode_segment(&id.to_string()))
    }

    /// One page of the collection.
    pub async fn list(&self, params: &ListParams) -> LmResult<Page<T>> {
        let request = RequestDescriptor::get(self.path.as_str()).query_pairs(params.to_query());
        self.client.send_page(request).await
    }

    /// Every entity matching `params`, following pagination from
    /// `params.page` (or the first page) until the server reports no more.
    pub async fn list_all(&self, params: &ListParams) -> LmResult<Vec<T>> {
        let mut params = params.clone();
        if params.page_size.is_none() {
            params.page_size = Some(DEFAULT_PAGE_SIZE);
        }
        let mut page_number = params.page.unwrap_or(1);
        let mut items = Vec::new();

        loop {
            params.page = Some(page_number);
            let page = self.list(&params).await?;
            let next = page.next_page();
            let fetched = page.len();
            items.extend(page);

            match next {
                Some(n) if fetched > 0 && n > page_number => page_number = n,
                _ => break,
            }
        }

        debug!("fetched {} records from {}", items.len(), self.path);
        Ok(items)
    }

    /// Fetch one entity.
    pub async fn get(&self, id: impl fmt::Display) -> LmResult<T> {
        let id = id.to_string();
        let request = RequestDescriptor::get(self.item_path(&id)).resource(self.kind(), &id);
        self.client.send(request).await
    }

    pub async fn create(&self, input: &I) -> LmResult<T> {
        let request = RequestDescriptor::post(self.path.as_str()).json(input)?;
        self.client.send(request).await
    }

    /// Create with an idempotency key, which makes the call retry-safe.
    pub async fn create_idempotent(&self, input: &I, key: &str) -> LmResult<T> {
        let request = RequestDescriptor::post(self.path.as_str())
            .json(input)?
            .idempotency_key(key);
        self.client.send(request).await
    }

    pub async fn update(&self, id: impl fmt::Display, input: &I) -> LmResult<T> {
        let id = id.to_string();
        let request = RequestDescriptor::put(self.item_path(&id))
            .resource(self.kind(), &id)
            .json(input)?;
        self.client.send(request).await
    }

    /// Delete one entity. A 2xx (including 204) resolves to `true`.
    pub async fn delete(&self, id: impl fmt::Display) -> LmResult<bool> {
        let id = id.to_string();
        let request = RequestDescriptor::delete(self.item_path(&id)).resource(self.kind(), &id);
        self.client.send_no_content(request).await
    }

    /// First page of entities matching the given query pairs.
    pub async fn find<K, V>(&self, pairs: impl IntoIterator<Item = (K, V)>) -> LmResult<Page<T>>
    where
        K: Into<String>,
        V: ToString,
    {
        let request = RequestDescriptor::get(self.path.as_str()).query_pairs(pairs);
        self.client.send_page(request).await
    }

    /// Client for a collection nested under one entity,
    /// e.g. `matters.nested(7, "notes")` for `/matters/7/notes`.
    pub fn nested<U, J>(&self, id: impl fmt::Display, sub: &str) -> ResourceClient<U, J>
    where
        U: DeserializeOwned,
        J: Serialize,
    {
        ResourceClient::new(
            self.client.clone(),
            format!("{}/{}", self.item_path(id), sub.trim_matches('/')),
        )
    }

    /// Schema-less call relative to the collection path, e.g.
    /// `action(Method::POST, "bulk", Some(body))` for `POST /contacts/bulk`.
    pub async fn action(&self, method: Method, suffix: &str, body: Option<Value>) -> LmResult<Value> {
        let path = format!("{}/{}", self.path, suffix.trim_matches('/'));
        let mut request = RequestDescriptor::new(method, path);
        if let Some(body) = body {
            request = request.json_value(body);
        }
        let data: Option<Value> = self.client.send(request).await?;
        Ok(data.unwrap_or(Value::Null))
    }

    /// Create several entities in one call.
    pub async fn bulk_create(&self, inputs: &[I]) -> LmResult<Value> {
        let mut body = serde_json::Map::new();
        body.insert("data".to_string(), serde_json::to_value(inputs)?);
        self.action(Method::POST, "bulk", Some(Value::Object(body)))
            .await
    }

    /// Ask the server to validate an input without persisting it.
    pub async fn validate(&self, input: &I) -> LmResult<Value> {
        let body = serde_json::to_value(input)?;
        self.action(Method::POST, "validate", Some(body)).await
    }
}

/// `+` is already escaped by the serializer, so the remaining `+`
/// characters stand for spaces.
fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
