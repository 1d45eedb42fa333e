#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared HTTP DTOs for the compute platform API.
//!
//! The backend owns every field here; the console only reads and reshapes
//! them. Timestamps stay as the server-formatted strings so a malformed value
//! degrades a single derived field instead of failing a whole list response.
//! Envelope flags (`success`, `message`) default when absent.
use serde::{Deserialize, Serialize};

/// Error body returned alongside non-2xx responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Human-readable message supplied by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Alternate error field used by some endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Backend-provided message, preferring `message` over `error`.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        fn pick(value: Option<&str>) -> Option<&str> {
            value.map(str::trim).filter(|text| !text.is_empty())
        }
        pick(self.message.as_deref()).or_else(|| pick(self.error.as_deref()))
    }
}

/// Minimal acknowledgement envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AckResponse {
    /// Whether the backend reported success.
    #[serde(default)]
    pub success: bool,
    /// Optional backend message.
    #[serde(default)]
    pub message: String,
}

/// Registerable client organisation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientOrg {
    /// Organisation identifier.
    pub client_id: String,
    /// Display name.
    pub name: String,
    /// Public website, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Registered entity number, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_number: Option<String>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: String,
}

/// Response body for `GET /clients`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientListResponse {
    /// Whether the backend reported success.
    #[serde(default)]
    pub success: bool,
    /// Organisations available for registration.
    #[serde(default)]
    pub clients: Option<Vec<ClientOrg>>,
}

impl ClientListResponse {
    /// Organisations, treating a missing list as empty.
    #[must_use]
    pub fn into_clients(self) -> Vec<ClientOrg> {
        self.clients.unwrap_or_default()
    }
}

/// Request body for `POST /user/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Response body for `POST /user/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    /// Whether the backend reported success.
    #[serde(default)]
    pub success: bool,
    /// Optional backend message.
    #[serde(default)]
    pub message: String,
    /// Bearer token for subsequent requests.
    pub token: String,
    /// Authenticated user identifier.
    #[serde(default)]
    pub user_id: String,
    /// Organisation the user belongs to.
    #[serde(default)]
    pub client_id: String,
    /// Name shown in the console header.
    #[serde(default)]
    pub display_name: String,
}

/// Request body for `POST /user/register`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterUserRequest {
    /// Organisation the new account joins.
    pub client_id: String,
    /// Account email.
    pub email: String,
    /// Name shown in the console header.
    pub display_name: String,
    /// Account password.
    pub password: String,
}

/// Request body for `POST /client/register`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterClientRequest {
    /// New organisation name.
    pub client_name: String,
    /// Administrator username.
    pub username: String,
    /// Administrator password.
    pub password: String,
}

/// Response body shared by both registration endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterResponse {
    /// Whether the backend reported success.
    #[serde(default)]
    pub success: bool,
    /// Optional backend message.
    #[serde(default)]
    pub message: String,
    /// Bearer token for subsequent requests.
    pub token: String,
    /// New user identifier.
    #[serde(default)]
    pub user_id: String,
    /// Organisation identifier.
    #[serde(default)]
    pub client_id: String,
}

/// Raw worker heartbeat snapshot as reported by `GET /workers/status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerStatusDto {
    /// Worker identifier.
    pub worker_id: String,
    /// Owning organisation.
    pub client_id: String,
    /// Physical core count.
    #[serde(default)]
    pub cpu_cores: u32,
    /// Nominal CPU frequency in GHz.
    #[serde(default)]
    pub cpu_frequency_ghz: f64,
    /// Installed memory in GB.
    #[serde(default)]
    pub memory_gb: f64,
    /// Installed video memory in GB.
    #[serde(default)]
    pub vram_gb: f64,
    /// CPU utilisation percentage.
    #[serde(default)]
    pub cpu_usage_percent: f64,
    /// Memory utilisation percentage.
    #[serde(default)]
    pub memory_usage_percent: f64,
    /// Video memory utilisation percentage.
    #[serde(default)]
    pub vram_usage_percent: f64,
    /// RFC 3339 timestamp of the last heartbeat.
    pub last_heartbeat: String,
}

/// Response body for `GET /workers/status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkerListResponse {
    /// Whether the backend reported success.
    #[serde(default)]
    pub success: bool,
    /// Scope the list was resolved for, when the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Worker snapshots.
    #[serde(default)]
    pub workers: Vec<WorkerStatusDto>,
    /// Count reported by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

/// Uploaded file metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    /// File identifier.
    pub file_id: String,
    /// Original file name.
    pub file_name: String,
    /// Size in bytes.
    #[serde(default)]
    pub file_size: u64,
    /// Download location.
    #[serde(default)]
    pub file_url: String,
    /// Upload timestamp.
    #[serde(default)]
    pub uploaded_at: String,
    /// Uploading user.
    #[serde(default)]
    pub user_id: String,
}

/// Response body for `GET /files`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileListResponse {
    /// Whether the backend reported success.
    #[serde(default)]
    pub success: bool,
    /// Files visible to the caller.
    #[serde(default)]
    pub files: Option<Vec<FileRecord>>,
}

impl FileListResponse {
    /// Files, treating a missing or null list as empty.
    #[must_use]
    pub fn into_files(self) -> Vec<FileRecord> {
        self.files.unwrap_or_default()
    }
}

/// Response body for `POST /file/upload`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadFileResponse {
    /// Whether the backend reported success.
    #[serde(default)]
    pub success: bool,
    /// Optional backend message.
    #[serde(default)]
    pub message: String,
    /// Identifier of the stored file.
    pub file_id: String,
    /// Download location of the stored file.
    #[serde(default)]
    pub file_url: String,
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, not yet scheduled.
    Init,
    /// Subtasks assigned to workers.
    Assigned,
    /// Workers are computing.
    Running,
    /// Completed successfully.
    Success,
    /// Failed permanently.
    Failure,
    /// A round failed and is being retried.
    Retrying,
}

impl TaskStatus {
    /// Whether the status ends the task lifecycle.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Assigned => "assigned",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Retrying => "retrying",
        }
    }
}

/// Lifecycle state of a subtask.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SubtaskStatus {
    /// Created, not yet dispatched.
    Init,
    /// Queued on a worker.
    Waiting,
    /// Being computed.
    Computing,
    /// Finished successfully.
    Success,
    /// Finished with an error.
    Failure,
}

impl SubtaskStatus {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Waiting => "waiting",
            Self::Computing => "computing",
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// One partition of a task's data range assigned to one worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subtask {
    /// Subtask identifier.
    pub subtask_id: String,
    /// Worker computing the partition.
    #[serde(default)]
    pub worker_id: String,
    /// First index of the partition.
    #[serde(default)]
    pub start_index: u64,
    /// Last index of the partition.
    #[serde(default)]
    pub end_index: u64,
    /// Current state.
    pub subtask_status: SubtaskStatus,
    /// Progress as a percentage string such as `"42.5%"`.
    #[serde(default)]
    pub progress: String,
    /// Partial result values, once computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<f64>>,
    /// Failure detail, when failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A computation job split into subtasks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Task identifier.
    pub task_id: String,
    /// Algorithm being executed.
    pub function_id: String,
    /// Submitting user.
    #[serde(default)]
    pub user_id: String,
    /// Input file location.
    #[serde(default)]
    pub file_url: String,
    /// Current state.
    pub task_status: TaskStatus,
    /// Partitions of the current round.
    #[serde(default)]
    pub subtask_list: Vec<Subtask>,
    /// Retries consumed so far.
    #[serde(default)]
    pub retry_times: u32,
    /// One-based round currently executing.
    #[serde(default)]
    pub current_round: u32,
    /// Total rounds planned.
    #[serde(default)]
    pub max_rounds: u32,
    /// Input size in records.
    #[serde(default)]
    pub task_volume: u64,
    /// Final result, once available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: String,
    /// Completion timestamp, once terminal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

/// Request body for `POST /task/execute`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateTaskRequest {
    /// Algorithm to run.
    pub function_id: String,
}

/// Response body for `POST /task/execute`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecuteTaskResponse {
    /// Whether the backend reported success.
    #[serde(default)]
    pub success: bool,
    /// Optional backend message.
    #[serde(default)]
    pub message: String,
    /// Identifier of the created task.
    pub task_id: String,
}

/// Response body for `GET /task/status/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskStatusResponse {
    /// Whether the backend reported success.
    #[serde(default)]
    pub success: bool,
    /// Optional backend message.
    #[serde(default)]
    pub message: String,
    /// Current task snapshot.
    pub task: Task,
}

/// Response body for `GET /tasks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskListResponse {
    /// Whether the backend reported success.
    #[serde(default)]
    pub success: bool,
    /// Tasks visible to the caller.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_prefers_message_and_skips_blank() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"message":"bad function id","error":"x"}"#).unwrap();
        assert_eq!(body.detail(), Some("bad function id"));

        let body: ErrorBody = serde_json::from_str(r#"{"message":"  ","error":"quota"}"#).unwrap();
        assert_eq!(body.detail(), Some("quota"));
        assert_eq!(ErrorBody::default().detail(), None);

        let body = ErrorBody {
            message: None,
            error: Some("  worker offline \n".to_string()),
        };
        assert_eq!(body.detail(), Some("worker offline"));
    }

    #[test]
    fn task_status_terminal_states() {
        assert!(TaskStatus::Success.is_terminal());
        assert!(TaskStatus::Failure.is_terminal());
        for status in [
            TaskStatus::Init,
            TaskStatus::Assigned,
            TaskStatus::Running,
            TaskStatus::Retrying,
        ] {
            assert!(!status.is_terminal(), "{} should not be terminal", status.as_str());
        }
    }

    #[test]
    fn task_deserializes_with_sparse_fields() {
        let task: Task = serde_json::from_str(
            r#"{
                "task_id": "t-1",
                "function_id": "matrix_sum",
                "task_status": "running",
                "subtask_list": [
                    {"subtask_id": "s-1", "subtask_status": "computing", "progress": "40%"}
                ],
                "current_round": 1,
                "max_rounds": 2
            }"#,
        )
        .unwrap();
        assert_eq!(task.task_status, TaskStatus::Running);
        assert_eq!(task.subtask_list[0].subtask_status, SubtaskStatus::Computing);
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn file_list_tolerates_null_files() {
        let response: FileListResponse =
            serde_json::from_str(r#"{"success": true, "files": null}"#).unwrap();
        assert!(response.into_files().is_empty());
    }
}
