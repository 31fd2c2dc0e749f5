//! Matter endpoints.

use std::ops::Deref;

use lm_core::error::LmResult;
use lm_models::{Matter, MatterInput, MatterStatus, MatterSubStatus, Note, NoteInput, Task, TaskInput};

use crate::client::ApiClient;
use crate::request::RequestDescriptor;
use crate::resource::{ListParams, ResourceClient};

/// `/matters`
#[derive(Debug, Clone)]
pub struct Matters {
    resource: ResourceClient<Matter, MatterInput>,
}

impl Matters {
    pub fn new(client: ApiClient) -> Self {
        Self {
            resource: ResourceClient::new(client, "/matters"),
        }
    }

    /// All matters in a lifecycle state.
    pub async fn list_by_status(&self, status: MatterStatus) -> LmResult<Vec<Matter>> {
        self.resource
            .list_all(&ListParams::new().filter("status", status.as_str()))
            .await
    }

    /// All matters for one contact.
    pub async fn list_for_contact(&self, contact_id: i64) -> LmResult<Vec<Matter>> {
        self.resource
            .list_all(&ListParams::new().filter("contact_id", contact_id))
            .await
    }

    pub async fn find_by_case_number(&self, case_number: &str) -> LmResult<Option<Matter>> {
        let page = self.resource.find([("case_number", case_number)]).await?;
        Ok(page.into_iter().next())
    }

    /// Set a matter's status.
    pub async fn change_status(&self, matter_id: i64, status: MatterStatus) -> LmResult<Matter> {
        let input = MatterInput {
            status: Some(status),
            ..Default::default()
        };
        self.resource.update(matter_id, &input).await
    }

    /// Sub-statuses configured for the firm.
    pub async fn sub_statuses(&self) -> LmResult<Vec<MatterSubStatus>> {
        let page = self
            .resource
            .client()
            .send_page::<MatterSubStatus>(RequestDescriptor::get("/matter_sub_statuses"))
            .await?;
        Ok(page.items)
    }

    pub fn notes(&self, matter_id: i64) -> ResourceClient<Note, NoteInput> {
        self.resource.nested(matter_id, "notes")
    }

    pub fn tasks(&self, matter_id: i64) -> ResourceClient<Task, TaskInput> {
        self.resource.nested(matter_id, "tasks")
    }
}

impl Deref for Matters {
    type Target = ResourceClient<Matter, MatterInput>;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}
