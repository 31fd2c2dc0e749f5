//! Calendar event endpoints.

use std::ops::Deref;

use chrono::{DateTime, SecondsFormat, Utc};

use lm_core::error::{LmError, LmResult};
use lm_models::{Event, EventInput, EventLocation, EventType};

use crate::client::ApiClient;
use crate::request::RequestDescriptor;
use crate::resource::{ListParams, ResourceClient};

/// `/events`
#[derive(Debug, Clone)]
pub struct Events {
    resource: ResourceClient<Event, EventInput>,
}

impl Events {
    pub fn new(client: ApiClient) -> Self {
        Self {
            resource: ResourceClient::new(client, "/events"),
        }
    }

    /// Events starting within `[from, to]`.
    pub async fn list_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> LmResult<Vec<Event>> {
        if to < from {
            return Err(LmError::InvalidConfiguration(format!(
                "event range ends before it starts ({from} > {to})"
            )));
        }
        let params = ListParams::new()
            .filter("start_date", from.to_rfc3339_opts(SecondsFormat::Secs, true))
            .filter("end_date", to.to_rfc3339_opts(SecondsFormat::Secs, true));
        self.resource.list_all(&params).await
    }

    pub async fn list_for_matter(&self, matter_id: i64) -> LmResult<Vec<Event>> {
        self.resource
            .list_all(&ListParams::new().filter("matter_id", matter_id))
            .await
    }

    pub async fn list_for_contact(&self, contact_id: i64) -> LmResult<Vec<Event>> {
        self.resource
            .list_all(&ListParams::new().filter("contact_id", contact_id))
            .await
    }

    pub async fn event_types(&self) -> LmResult<Vec<EventType>> {
        let page = self
            .resource
            .client()
            .send_page::<EventType>(RequestDescriptor::get("/event_types"))
            .await?;
        Ok(page.items)
    }

    pub async fn event_locations(&self) -> LmResult<Vec<EventLocation>> {
        let page = self
            .resource
            .client()
            .send_page::<EventLocation>(RequestDescriptor::get("/event_locations"))
            .await?;
        Ok(page.items)
    }
}

impl Deref for Events {
    type Target = ResourceClient<Event, EventInput>;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}
