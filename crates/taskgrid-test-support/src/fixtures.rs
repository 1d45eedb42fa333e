//! DTO builders with sensible defaults.

use chrono::{DateTime, TimeZone, Utc};
use taskgrid_api_models::{
    FileRecord, LoginResponse, Subtask, SubtaskStatus, Task, TaskStatus, WorkerListResponse,
    WorkerStatusDto,
};

/// Fixed instant used as "now" by time-sensitive tests (2026-03-01T12:00:00Z).
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Worker whose last heartbeat was `heartbeat_age_secs` before [`fixed_now`].
#[must_use]
pub fn worker(id: &str, cpu: f64, memory: f64, heartbeat_age_secs: i64) -> WorkerStatusDto {
    let heartbeat = fixed_now() - chrono::TimeDelta::seconds(heartbeat_age_secs);
    WorkerStatusDto {
        worker_id: id.to_string(),
        client_id: "client-1".to_string(),
        cpu_cores: 8,
        cpu_frequency_ghz: 3.2,
        memory_gb: 32.0,
        vram_gb: 8.0,
        cpu_usage_percent: cpu,
        memory_usage_percent: memory,
        vram_usage_percent: 10.0,
        last_heartbeat: heartbeat.to_rfc3339(),
    }
}

/// Worker list envelope.
#[must_use]
pub fn worker_list(workers: Vec<WorkerStatusDto>) -> WorkerListResponse {
    WorkerListResponse {
        success: true,
        client_id: Some("client-1".to_string()),
        count: u32::try_from(workers.len()).ok(),
        workers,
    }
}

/// Subtask with the given progress string.
#[must_use]
pub fn subtask(id: &str, status: SubtaskStatus, progress: &str) -> Subtask {
    Subtask {
        subtask_id: id.to_string(),
        worker_id: "worker-1".to_string(),
        start_index: 0,
        end_index: 100,
        subtask_status: status,
        progress: progress.to_string(),
        result: None,
        error: None,
    }
}

/// Task in `status` with no subtasks.
#[must_use]
pub fn task(id: &str, status: TaskStatus) -> Task {
    Task {
        task_id: id.to_string(),
        function_id: "sum".to_string(),
        user_id: "user-1".to_string(),
        file_url: "/files/data.csv".to_string(),
        task_status: status,
        subtask_list: Vec::new(),
        retry_times: 0,
        current_round: 1,
        max_rounds: 1,
        task_volume: 100,
        result: None,
        created_at: "2026-03-01T08:00:00Z".to_string(),
        completed_at: None,
    }
}

/// File record of `size` bytes.
#[must_use]
pub fn file(id: &str, name: &str, size: u64) -> FileRecord {
    FileRecord {
        file_id: id.to_string(),
        file_name: name.to_string(),
        file_size: size,
        file_url: format!("/files/{id}"),
        uploaded_at: "2026-03-01T09:00:00Z".to_string(),
        user_id: "user-1".to_string(),
    }
}

/// Successful login payload.
#[must_use]
pub fn login_response(token: &str, display_name: &str) -> LoginResponse {
    LoginResponse {
        success: true,
        message: "ok".to_string(),
        token: token.to_string(),
        user_id: "user-1".to_string(),
        client_id: "client-1".to_string(),
        display_name: display_name.to_string(),
    }
}
