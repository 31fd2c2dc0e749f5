//! Expense endpoints.

use std::ops::Deref;

use lm_core::error::LmResult;
use lm_models::{Expense, ExpenseInput};

use crate::client::ApiClient;
use crate::resource::{ListParams, ResourceClient};

/// `/expenses`
#[derive(Debug, Clone)]
pub struct Expenses {
    resource: ResourceClient<Expense, ExpenseInput>,
}

impl Expenses {
    pub fn new(client: ApiClient) -> Self {
        Self {
            resource: ResourceClient::new(client, "/expenses"),
        }
    }

    pub async fn list_for_matter(&self, matter_id: i64) -> LmResult<Vec<Expense>> {
        self.resource
            .list_all(&ListParams::new().filter("matter_id", matter_id))
            .await
    }
}

impl Deref for Expenses {
    type Target = ResourceClient<Expense, ExpenseInput>;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}
