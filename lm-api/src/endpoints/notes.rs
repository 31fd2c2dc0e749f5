//! Note endpoints.

use std::ops::Deref;

use lm_core::error::LmResult;
use lm_models::{Note, NoteInput};

use crate::client::ApiClient;
use crate::resource::{ListParams, ResourceClient};

/// `/notes`
#[derive(Debug, Clone)]
pub struct Notes {
    resource: ResourceClient<Note, NoteInput>,
}

impl Notes {
    pub fn new(client: ApiClient) -> Self {
        Self {
            resource: ResourceClient::new(client, "/notes"),
        }
    }

    pub async fn list_for_matter(&self, matter_id: i64) -> LmResult<Vec<Note>> {
        self.resource
            .list_all(&ListParams::new().filter("matter_id", matter_id))
            .await
    }

    pub async fn list_for_contact(&self, contact_id: i64) -> LmResult<Vec<Note>> {
        self.resource
            .list_all(&ListParams::new().filter("contact_id", contact_id))
            .await
    }

    pub async fn pin(&self, note_id: i64, pinned: bool) -> LmResult<Note> {
        let input = NoteInput {
            pinned: Some(pinned),
            ..Default::default()
        };
        self.resource.update(note_id, &input).await
    }
}

impl Deref for Notes {
    type Target = ResourceClient<Note, NoteInput>;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}
