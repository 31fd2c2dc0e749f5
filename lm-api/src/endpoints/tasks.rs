//! Task endpoints.

use std::ops::Deref;

use lm_core::error::LmResult;
use lm_models::{Subtask, Task, TaskInput, TaskStatus};

use crate::client::ApiClient;
use crate::request::RequestDescriptor;
use crate::resource::{ListParams, ResourceClient};

/// `/tasks`
#[derive(Debug, Clone)]
pub struct Tasks {
    resource: ResourceClient<Task, TaskInput>,
}

impl Tasks {
    pub fn new(client: ApiClient) -> Self {
        Self {
            resource: ResourceClient::new(client, "/tasks"),
        }
    }

    pub async fn list_for_matter(&self, matter_id: i64) -> LmResult<Vec<Task>> {
        self.resource
            .list_all(&ListParams::new().filter("matter_id", matter_id))
            .await
    }

    pub async fn list_for_assignee(&self, user_id: i64) -> LmResult<Vec<Task>> {
        self.resource
            .list_all(&ListParams::new().filter("assignee_id", user_id))
            .await
    }

    /// Open tasks only.
    pub async fn list_incomplete(&self) -> LmResult<Vec<Task>> {
        self.resource
            .list_all(&ListParams::new().filter("completed", false))
            .await
    }

    pub async fn complete(&self, task_id: i64) -> LmResult<Task> {
        let input = TaskInput {
            completed: Some(true),
            ..Default::default()
        };
        self.resource.update(task_id, &input).await
    }

    pub fn subtasks(&self, task_id: i64) -> ResourceClient<Subtask> {
        self.resource.nested(task_id, "subtasks")
    }

    pub async fn statuses(&self) -> LmResult<Vec<TaskStatus>> {
        let page = self
            .resource
            .client()
            .send_page::<TaskStatus>(RequestDescriptor::get("/task_statuses"))
            .await?;
        Ok(page.items)
    }
}

impl Deref for Tasks {
    type Target = ResourceClient<Task, TaskInput>;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}
