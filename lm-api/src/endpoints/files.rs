//! File (document) endpoints: metadata CRUD, upload and download.

use std::ops::Deref;
use std::path::Path;

use reqwest::multipart::{Form, Part};
use tokio_util::sync::CancellationToken;
use tracing::info;

use lm_core::error::{LmError, LmResult};
use lm_models::FileRecord;

use crate::client::ApiClient;
use crate::request::RequestDescriptor;
use crate::resource::{ListParams, ResourceClient};

/// Where an uploaded file is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOwner {
    Matter(i64),
    Contact(i64),
}

/// `/files`
#[derive(Debug, Clone)]
pub struct Files {
    resource: ResourceClient<FileRecord>,
}

impl Files {
    pub fn new(client: ApiClient) -> Self {
        Self {
            resource: ResourceClient::new(client, "/files"),
        }
    }

    pub async fn list_for_matter(&self, matter_id: i64) -> LmResult<Vec<FileRecord>> {
        self.resource
            .list_all(&ListParams::new().filter("matter_id", matter_id))
            .await
    }

    pub async fn list_for_contact(&self, contact_id: i64) -> LmResult<Vec<FileRecord>> {
        self.resource
            .list_all(&ListParams::new().filter("contact_id", contact_id))
            .await
    }

    /// Upload file contents. Uploads are not retried on transient failures.
    pub async fn upload(
        &self,
        owner: FileOwner,
        file_name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> LmResult<FileRecord> {
        self.upload_with(owner, file_name, bytes, mime_type, CancellationToken::new())
            .await
    }

    /// [`upload`](Self::upload) that gives up with `Cancelled` once `cancel` fires.
    pub async fn upload_with(
        &self,
        owner: FileOwner,
        file_name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
        cancel: CancellationToken,
    ) -> LmResult<FileRecord> {
        let size = bytes.len();
        let make_form = || -> LmResult<Form> {
            let part = Part::bytes(bytes.clone())
                .file_name(file_name.to_string())
                .mime_str(mime_type)
                .map_err(|e| LmError::InvalidConfiguration(format!("invalid mime type: {e}")))?;
            let form = match owner {
                FileOwner::Matter(id) => Form::new().text("matter_id", id.to_string()),
                FileOwner::Contact(id) => Form::new().text("contact_id", id.to_string()),
            };
            Ok(form.text("name", file_name.to_string()).part("file", part))
        };

        let request = RequestDescriptor::post(self.resource.path()).cancel_with(cancel);
        let record: FileRecord = self
            .resource
            .client()
            .post_multipart(&request, make_form)
            .await?;
        info!("uploaded {file_name} ({size} bytes) as file {}", record.id);
        Ok(record)
    }

    /// Upload a file from disk, naming it after the path's file name.
    pub async fn upload_path(
        &self,
        owner: FileOwner,
        path: &Path,
        mime_type: &str,
    ) -> LmResult<FileRecord> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                LmError::InvalidConfiguration(format!("no file name in {}", path.display()))
            })?;
        self.upload(owner, file_name, bytes, mime_type).await
    }

    /// Raw file contents.
    pub async fn download(&self, file_id: i64) -> LmResult<Vec<u8>> {
        self.resource
            .client()
            .download(&format!("{}/{file_id}/download", self.resource.path()))
            .await
    }

    /// Download to disk, returning the number of bytes written.
    pub async fn download_to(&self, file_id: i64, dest: &Path) -> LmResult<usize> {
        let bytes = self.download(file_id).await?;
        tokio::fs::write(dest, &bytes).await?;
        Ok(bytes.len())
    }
}

impl Deref for Files {
    type Target = ResourceClient<FileRecord>;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}
