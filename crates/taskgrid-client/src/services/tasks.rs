//! Task submission and status.

use async_trait::async_trait;
use taskgrid_api_models::{
    CreateTaskRequest, ExecuteTaskResponse, Task, TaskListResponse, TaskStatusResponse,
};

use crate::error::ApiResult;
use crate::http::ApiClient;

/// Task endpoints.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Create and start a task.
    async fn execute(&self, request: &CreateTaskRequest) -> ApiResult<ExecuteTaskResponse>;

    /// Current state of one task.
    async fn status(&self, task_id: &str) -> ApiResult<Task>;

    /// Every task visible to the caller.
    async fn list(&self) -> ApiResult<Vec<Task>>;
}

/// [`TaskApi`] over HTTP.
#[derive(Clone)]
pub struct TaskService {
    client: ApiClient,
}

impl TaskService {
    /// Wrap a shared API client.
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TaskApi for TaskService {
    async fn execute(&self, request: &CreateTaskRequest) -> ApiResult<ExecuteTaskResponse> {
        self.client.post_json(&["task", "execute"], request).await
    }

    async fn status(&self, task_id: &str) -> ApiResult<Task> {
        let response: TaskStatusResponse =
            self.client.get_json(&["task", "status", task_id]).await?;
        Ok(response.task)
    }

    async fn list(&self) -> ApiResult<Vec<Task>> {
        let response: TaskListResponse = self.client.get_json(&["tasks"]).await?;
        Ok(response.tasks)
    }
}
