//! Custom contact type endpoints.

use std::ops::Deref;

use lm_core::error::LmResult;
use lm_models::{CustomContactType, CustomContactTypeInput};

use crate::client::ApiClient;
use crate::resource::{ListParams, ResourceClient};

/// `/custom_contact_types`
#[derive(Debug, Clone)]
pub struct CustomContactTypes {
    resource: ResourceClient<CustomContactType, CustomContactTypeInput>,
}

impl CustomContactTypes {
    pub fn new(client: ApiClient) -> Self {
        Self {
            resource: ResourceClient::new(client, "/custom_contact_types"),
        }
    }

    /// Look a type up by name, ignoring case.
    pub async fn find_by_name(&self, name: &str) -> LmResult<Option<CustomContactType>> {
        let all = self.resource.list_all(&ListParams::new()).await?;
        Ok(all.into_iter().find(|t| t.name.eq_ignore_ascii_case(name)))
    }
}

impl Deref for CustomContactTypes {
    type Target = ResourceClient<CustomContactType, CustomContactTypeInput>;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}
