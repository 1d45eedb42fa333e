//! File store: upload, list and delete with a full refetch after every
//! successful mutation. The list is never edited locally.

use std::sync::Arc;

use serde::Serialize;
use taskgrid_api_models::FileRecord;
use taskgrid_client::{FileApi, FileUpload};
use taskgrid_core::Notice;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::context::StoreContext;
use crate::error::{StoreError, StoreResult};
use crate::loading::{LoadingState, LoadingTracker};
use crate::sequence::RequestSequencer;

const STORE: &str = "file";

/// Observable state of the file store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileState {
    /// Files owned by the caller.
    pub files: Vec<FileRecord>,
    /// A list fetch is in flight.
    pub loading: bool,
}

impl LoadingState for FileState {
    fn loading_mut(&mut self) -> &mut bool {
        &mut self.loading
    }
}

/// Cheap handle over the shared file state.
#[derive(Clone)]
pub struct FileStore {
    inner: Arc<Inner>,
}

struct Inner {
    api: Arc<dyn FileApi>,
    context: StoreContext,
    state: watch::Sender<FileState>,
    sequence: RequestSequencer,
    loading: LoadingTracker,
}

impl FileStore {
    /// Store backed by `api`.
    #[must_use]
    pub fn new(api: Arc<dyn FileApi>, context: StoreContext) -> Self {
        let (state, _) = watch::channel(FileState::default());
        Self {
            inner: Arc::new(Inner {
                api,
                context,
                state,
                sequence: RequestSequencer::new(),
                loading: LoadingTracker::new(),
            }),
        }
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FileState> {
        self.inner.state.subscribe()
    }

    /// Clone of the current state.
    #[must_use]
    pub fn snapshot(&self) -> FileState {
        self.inner.state.borrow().clone()
    }

    /// Replace the list with the backend's. On failure the list is emptied.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    pub async fn fetch_files(&self) -> StoreResult<()> {
        let ticket = self.inner.sequence.issue();
        let loading = self.inner.loading.enter(&self.inner.state);
        let response = self.inner.api.list().await;

        let (files, outcome) = match response {
            Ok(files) => (files, Ok(())),
            Err(source) => {
                let err = StoreError::from(source);
                self.inner.context.report_fetch_failure(STORE, &err, false);
                (Vec::new(), Err(err))
            }
        };

        let mut fresh = false;
        self.inner.state.send_modify(|state| {
            fresh = self.inner.sequence.try_apply(ticket);
            if fresh {
                state.files = files;
            }
        });
        drop(loading);
        if !fresh {
            debug!(store = STORE, ticket = ticket.value(), "discarded stale file list");
        }
        outcome
    }

    /// Upload one file, then refetch the list.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure after one notice; the list is left
    /// untouched.
    pub async fn upload_file(&self, upload: FileUpload) -> StoreResult<String> {
        let file_name = upload.file_name.clone();
        match self.inner.api.upload(upload).await {
            Ok(response) => {
                info!(store = STORE, file_id = %response.file_id, file_name = %file_name, "file uploaded");
                self.inner
                    .context
                    .notify(Notice::success("File uploaded successfully"));
                self.refetch().await;
                Ok(response.file_id)
            }
            Err(source) => {
                let err = StoreError::from(source);
                self.inner
                    .context
                    .report_action_failure(STORE, &err, "File upload failed");
                Err(err)
            }
        }
    }

    /// Delete one file, then refetch the list.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure after one notice; the list is left
    /// untouched.
    pub async fn delete_file(&self, file_id: &str) -> StoreResult<()> {
        match self.inner.api.delete(file_id).await {
            Ok(_) => {
                info!(store = STORE, file_id, "file deleted");
                self.inner
                    .context
                    .notify(Notice::success("File deleted successfully"));
                self.refetch().await;
                Ok(())
            }
            Err(source) => {
                let err = StoreError::from(source);
                self.inner
                    .context
                    .report_action_failure(STORE, &err, "File deletion failed");
                Err(err)
            }
        }
    }

    async fn refetch(&self) {
        if let Err(err) = self.fetch_files().await {
            debug!(store = STORE, error = %err, "refetch after mutation failed");
        }
    }
}
