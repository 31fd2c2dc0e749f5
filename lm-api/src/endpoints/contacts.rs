//! Contact endpoints.

use std::ops::Deref;

use reqwest::Method;
use serde_json::Value;

use lm_core::error::LmResult;
use lm_models::{Address, AddressInput, Contact, ContactInput, EmailAddress, EmailAddressInput};

use crate::client::ApiClient;
use crate::resource::{ListParams, ResourceClient};
use crate::response::Page;

/// `/contacts`
#[derive(Debug, Clone)]
pub struct Contacts {
    resource: ResourceClient<Contact, ContactInput>,
}

impl Contacts {
    pub fn new(client: ApiClient) -> Self {
        Self {
            resource: ResourceClient::new(client, "/contacts"),
        }
    }

    /// The contact with this email address, if any.
    pub async fn find_by_email(&self, email: &str) -> LmResult<Option<Contact>> {
        let page = self.resource.find([("email", email)]).await?;
        Ok(page.into_iter().next())
    }

    /// Free-text search across names, emails and phone numbers.
    pub async fn search(&self, query: &str, params: &ListParams) -> LmResult<Page<Contact>> {
        let params = params.clone().filter("q", query);
        self.resource.list(&params).await
    }

    /// Contacts of one custom contact type.
    pub async fn list_by_type(&self, custom_contact_type_id: i64) -> LmResult<Vec<Contact>> {
        let params = ListParams::new().filter("custom_contact_type_id", custom_contact_type_id);
        self.resource.list_all(&params).await
    }

    /// Contacts carrying a tag.
    pub async fn list_by_tag(&self, tag: &str) -> LmResult<Vec<Contact>> {
        self.resource
            .list_all(&ListParams::new().filter("tag", tag))
            .await
    }

    pub fn email_addresses(&self, contact_id: i64) -> ResourceClient<EmailAddress, EmailAddressInput> {
        self.resource.nested(contact_id, "email_addresses")
    }

    pub fn addresses(&self, contact_id: i64) -> ResourceClient<Address, AddressInput> {
        self.resource.nested(contact_id, "addresses")
    }

    /// Add tags to a contact. Returns the server's untyped result.
    pub async fn add_tags(&self, contact_id: i64, tags: &[&str]) -> LmResult<Value> {
        let body = serde_json::json!({ "tags": tags });
        self.resource
            .action(Method::POST, &format!("{contact_id}/tags"), Some(body))
            .await
    }

    /// Merge `duplicate_id` into `contact_id`.
    pub async fn merge(&self, contact_id: i64, duplicate_id: i64) -> LmResult<Contact> {
        let body = serde_json::json!({ "duplicate_id": duplicate_id });
        let value = self
            .resource
            .action(Method::POST, &format!("{contact_id}/merge"), Some(body))
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}

impl Deref for Contacts {
    type Target = ResourceClient<Contact, ContactInput>;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}
