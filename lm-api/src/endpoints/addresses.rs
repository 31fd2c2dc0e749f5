//! Postal address endpoints.

use std::ops::Deref;

use lm_core::error::LmResult;
use lm_models::{Address, AddressInput};

use crate::client::ApiClient;
use crate::resource::{ListParams, ResourceClient};

/// `/addresses`
#[derive(Debug, Clone)]
pub struct Addresses {
    resource: ResourceClient<Address, AddressInput>,
}

impl Addresses {
    pub fn new(client: ApiClient) -> Self {
        Self {
            resource: ResourceClient::new(client, "/addresses"),
        }
    }

    pub async fn list_for_contact(&self, contact_id: i64) -> LmResult<Vec<Address>> {
        self.resource
            .list_all(&ListParams::new().filter("contact_id", contact_id))
            .await
    }
}

impl Deref for Addresses {
    type Target = ResourceClient<Address, AddressInput>;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}
