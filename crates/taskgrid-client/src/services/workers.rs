//! Worker fleet status.

use async_trait::async_trait;
use taskgrid_api_models::WorkerListResponse;

use crate::error::ApiResult;
use crate::http::ApiClient;

/// Worker status endpoint. The backend scopes the list to the caller's token.
#[async_trait]
pub trait WorkerApi: Send + Sync {
    /// Current status of every worker visible to the caller.
    async fn list_workers(&self) -> ApiResult<WorkerListResponse>;
}

/// [`WorkerApi`] over HTTP.
#[derive(Clone)]
pub struct WorkerService {
    client: ApiClient,
}

impl WorkerService {
    /// Wrap a shared API client.
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WorkerApi for WorkerService {
    async fn list_workers(&self) -> ApiResult<WorkerListResponse> {
        self.client.get_json(&["workers", "status"]).await
    }
}
