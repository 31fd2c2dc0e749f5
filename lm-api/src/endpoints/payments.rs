//! Payment endpoints.

use std::ops::Deref;

use reqwest::Method;
use serde_json::Value;

use lm_core::error::LmResult;
use lm_models::{Payment, PaymentInput, PaymentStatus};

use crate::client::ApiClient;
use crate::resource::{ListParams, ResourceClient};

/// `/payments`
#[derive(Debug, Clone)]
pub struct Payments {
    resource: ResourceClient<Payment, PaymentInput>,
}

impl Payments {
    pub fn new(client: ApiClient) -> Self {
        Self {
            resource: ResourceClient::new(client, "/payments"),
        }
    }

    pub async fn list_for_contact(&self, contact_id: i64) -> LmResult<Vec<Payment>> {
        self.resource
            .list_all(&ListParams::new().filter("contact_id", contact_id))
            .await
    }

    pub async fn list_for_matter(&self, matter_id: i64) -> LmResult<Vec<Payment>> {
        self.resource
            .list_all(&ListParams::new().filter("matter_id", matter_id))
            .await
    }

    pub async fn list_by_status(&self, status: PaymentStatus) -> LmResult<Vec<Payment>> {
        self.resource
            .list_all(&ListParams::new().filter("status", status.as_str()))
            .await
    }

    /// Refund a payment, in full when `amount` is `None`.
    pub async fn refund(&self, payment_id: i64, amount: Option<f64>) -> LmResult<Value> {
        let body = serde_json::json!({ "amount": amount });
        self.resource
            .action(Method::POST, &format!("{payment_id}/refund"), Some(body))
            .await
    }
}

impl Deref for Payments {
    type Target = ResourceClient<Payment, PaymentInput>;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}
