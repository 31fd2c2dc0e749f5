//! Email address endpoints.

use std::ops::Deref;

use lm_core::error::LmResult;
use lm_models::{EmailAddress, EmailAddressInput};

use crate::client::ApiClient;
use crate::resource::{ListParams, ResourceClient};

/// `/email_addresses`
#[derive(Debug, Clone)]
pub struct EmailAddresses {
    resource: ResourceClient<EmailAddress, EmailAddressInput>,
}

impl EmailAddresses {
    pub fn new(client: ApiClient) -> Self {
        Self {
            resource: ResourceClient::new(client, "/email_addresses"),
        }
    }

    pub async fn list_for_contact(&self, contact_id: i64) -> LmResult<Vec<EmailAddress>> {
        self.resource
            .list_all(&ListParams::new().filter("contact_id", contact_id))
            .await
    }

    /// The contact's primary address, if one is marked.
    pub async fn primary_for_contact(&self, contact_id: i64) -> LmResult<Option<EmailAddress>> {
        let all = self.list_for_contact(contact_id).await?;
        Ok(all.into_iter().find(|e| e.primary))
    }
}

impl Deref for EmailAddresses {
    type Target = ResourceClient<EmailAddress, EmailAddressInput>;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}
