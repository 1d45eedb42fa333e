//! Data file upload, listing and deletion.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use taskgrid_api_models::{AckResponse, FileListResponse, FileRecord, UploadFileResponse};

use crate::error::ApiResult;
use crate::http::ApiClient;

/// Multipart form field carrying the file body.
pub const UPLOAD_FIELD: &str = "file";

/// A file ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Name reported to the backend.
    pub file_name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Build an upload from a name and contents.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// File endpoints. The owning user is derived from the token server-side.
#[async_trait]
pub trait FileApi: Send + Sync {
    /// Upload one file as `multipart/form-data`.
    async fn upload(&self, upload: FileUpload) -> ApiResult<UploadFileResponse>;

    /// Every file owned by the caller.
    async fn list(&self) -> ApiResult<Vec<FileRecord>>;

    /// Delete one file.
    async fn delete(&self, file_id: &str) -> ApiResult<AckResponse>;
}

/// [`FileApi`] over HTTP.
#[derive(Clone)]
pub struct FileService {
    client: ApiClient,
}

impl FileService {
    /// Wrap a shared API client.
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FileApi for FileService {
    async fn upload(&self, upload: FileUpload) -> ApiResult<UploadFileResponse> {
        let part = Part::bytes(upload.bytes).file_name(upload.file_name);
        let form = Form::new().part(UPLOAD_FIELD, part);
        self.client.post_multipart(&["file", "upload"], form).await
    }

    async fn list(&self) -> ApiResult<Vec<FileRecord>> {
        let response: FileListResponse = self.client.get_json(&["files"]).await?;
        Ok(response.into_files())
    }

    async fn delete(&self, file_id: &str) -> ApiResult<AckResponse> {
        self.client.delete_json(&["files", file_id]).await
    }
}
