//! Fakes for the clock, session storage, notifier and service seams.
//!
//! Scripted services replay a queue of [`Step`]s in call order. The last step
//! repeats once the queue drains so long polling runs need no padding. Each
//! step may carry a delay which, under a paused Tokio clock, lets tests control
//! exactly when a response lands.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::StatusCode;
use taskgrid_api_models::{
    AckResponse, ClientOrg, CreateTaskRequest, ExecuteTaskResponse, FileRecord, LoginRequest,
    LoginResponse, RegisterClientRequest, RegisterResponse, RegisterUserRequest, Task,
    UploadFileResponse, WorkerListResponse,
};
use taskgrid_client::{ApiError, ApiResult, AuthApi, FileApi, FileUpload, TaskApi, WorkerApi};
use taskgrid_core::{
    Clock, Notice, NoticeLevel, Notifier, SessionStore, StorageError, StorageResult,
    StoredSession,
};

use crate::fixtures::fixed_now;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Manually advanced clock starting at [`fixed_now`].
#[derive(Debug)]
pub struct FakeClock {
    now: Mutex<DateTime<Utc>>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::at(fixed_now())
    }
}

impl FakeClock {
    /// Clock frozen at `instant`.
    #[must_use]
    pub const fn at(instant: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(instant),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = lock(&self.now);
        *now += delta;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *lock(&self.now)
    }
}

/// In-memory session store with an optional write failure.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<StoredSession>>,
    fail_writes: Mutex<bool>,
    saves: AtomicUsize,
    clears: AtomicUsize,
}

impl MemorySessionStore {
    /// Store pre-populated with `session`.
    #[must_use]
    pub fn with_session(session: StoredSession) -> Self {
        let store = Self::default();
        *lock(&store.session) = Some(session);
        store
    }

    /// Make subsequent `save` calls fail.
    pub fn fail_writes(&self) {
        *lock(&self.fail_writes) = true;
    }

    /// Current contents without going through the trait.
    #[must_use]
    pub fn current(&self) -> Option<StoredSession> {
        lock(&self.session).clone()
    }

    /// Number of successful saves.
    #[must_use]
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Number of clears.
    #[must_use]
    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> StorageResult<Option<StoredSession>> {
        Ok(lock(&self.session).clone())
    }

    fn save(&self, session: &StoredSession) -> StorageResult<()> {
        if *lock(&self.fail_writes) {
            return Err(StorageError::io(
                "memory.save",
                "memory",
                io::Error::other("write refused"),
            ));
        }
        *lock(&self.session) = Some(session.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        *lock(&self.session) = None;
        self.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Notifier that records every notice.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    /// Every recorded notice in order.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.notices).clone()
    }

    /// Messages of notices at `level`.
    #[must_use]
    pub fn messages(&self, level: NoticeLevel) -> Vec<String> {
        lock(&self.notices)
            .iter()
            .filter(|notice| notice.level == level)
            .map(|notice| notice.message.clone())
            .collect()
    }

    /// Error notice messages.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.messages(NoticeLevel::Error)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        lock(&self.notices).push(notice);
    }
}

/// Failure a scripted step resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// 401 on an auth endpoint.
    InvalidCredentials,
    /// 401 elsewhere.
    SessionExpired,
    /// 4xx with an optional backend message.
    Rejected(StatusCode, Option<String>),
    /// 404.
    NotFound,
    /// 5xx.
    Server(StatusCode),
}

impl Failure {
    fn into_error(self, endpoint: &str) -> ApiError {
        let endpoint = endpoint.to_string();
        match self {
            Self::InvalidCredentials => ApiError::InvalidCredentials { endpoint },
            Self::SessionExpired => ApiError::SessionExpired { endpoint },
            Self::Rejected(status, message) => ApiError::Rejected {
                endpoint,
                status,
                message,
            },
            Self::NotFound => ApiError::NotFound { endpoint },
            Self::Server(status) => ApiError::Server { endpoint, status },
        }
    }
}

/// One scripted response.
#[derive(Debug, Clone)]
pub struct Step<T> {
    delay: Duration,
    outcome: Result<T, Failure>,
}

impl<T> Step<T> {
    /// Immediate success.
    pub fn ok(value: T) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Ok(value),
        }
    }

    /// Immediate failure.
    pub fn fail(failure: Failure) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Err(failure),
        }
    }

    /// Immediate 500.
    pub fn server_error() -> Self {
        Self::fail(Failure::Server(StatusCode::INTERNAL_SERVER_ERROR))
    }

    /// Resolve only after `delay` has elapsed.
    #[must_use]
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Call-ordered queue of steps with a call counter.
#[derive(Debug)]
struct Script<T> {
    endpoint: &'static str,
    steps: Mutex<VecDeque<Step<T>>>,
    calls: AtomicUsize,
}

impl<T: Clone> Script<T> {
    fn new(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            steps: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    fn push(&self, step: Step<T>) {
        lock(&self.steps).push_back(step);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn next(&self) -> ApiResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = {
            let mut steps = lock(&self.steps);
            if steps.len() > 1 {
                steps.pop_front()
            } else {
                steps.front().cloned()
            }
        };
        let Some(step) = step else {
            return Err(Failure::NotFound.into_error(self.endpoint));
        };
        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }
        step.outcome
            .map_err(|failure| failure.into_error(self.endpoint))
    }
}

/// Scripted [`WorkerApi`].
#[derive(Debug)]
pub struct ScriptedWorkerApi {
    list: Script<WorkerListResponse>,
}

impl Default for ScriptedWorkerApi {
    fn default() -> Self {
        Self {
            list: Script::new("/workers/status"),
        }
    }
}

impl ScriptedWorkerApi {
    /// Queue a response for `list_workers`.
    #[must_use]
    pub fn then(self, step: Step<WorkerListResponse>) -> Self {
        self.list.push(step);
        self
    }

    /// Queue a response after construction.
    pub fn push(&self, step: Step<WorkerListResponse>) {
        self.list.push(step);
    }

    /// Number of `list_workers` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.list.calls()
    }
}

#[async_trait]
impl WorkerApi for ScriptedWorkerApi {
    async fn list_workers(&self) -> ApiResult<WorkerListResponse> {
        self.list.next().await
    }
}

/// Scripted [`TaskApi`].
#[derive(Debug)]
pub struct ScriptedTaskApi {
    execute: Script<ExecuteTaskResponse>,
    status: Script<Task>,
    list: Script<Vec<Task>>,
    requested: Mutex<Vec<String>>,
}

impl Default for ScriptedTaskApi {
    fn default() -> Self {
        Self {
            execute: Script::new("/task/execute"),
            status: Script::new("/task/status"),
            list: Script::new("/tasks"),
            requested: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedTaskApi {
    /// Queue a response for `execute`.
    #[must_use]
    pub fn then_execute(self, step: Step<ExecuteTaskResponse>) -> Self {
        self.execute.push(step);
        self
    }

    /// Queue a response for `status`.
    #[must_use]
    pub fn then_status(self, step: Step<Task>) -> Self {
        self.status.push(step);
        self
    }

    /// Queue a response for `list`.
    #[must_use]
    pub fn then_list(self, step: Step<Vec<Task>>) -> Self {
        self.list.push(step);
        self
    }

    /// Number of `status` calls so far.
    #[must_use]
    pub fn status_calls(&self) -> usize {
        self.status.calls()
    }

    /// Number of `list` calls so far.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.list.calls()
    }

    /// Function identifiers submitted through `execute`.
    #[must_use]
    pub fn submitted(&self) -> Vec<String> {
        lock(&self.requested).clone()
    }
}

#[async_trait]
impl TaskApi for ScriptedTaskApi {
    async fn execute(&self, request: &CreateTaskRequest) -> ApiResult<ExecuteTaskResponse> {
        lock(&self.requested).push(request.function_id.clone());
        self.execute.next().await
    }

    async fn status(&self, _task_id: &str) -> ApiResult<Task> {
        self.status.next().await
    }

    async fn list(&self) -> ApiResult<Vec<Task>> {
        self.list.next().await
    }
}

/// Scripted [`FileApi`].
#[derive(Debug)]
pub struct ScriptedFileApi {
    upload: Script<UploadFileResponse>,
    list: Script<Vec<FileRecord>>,
    delete: Script<AckResponse>,
    uploaded: Mutex<Vec<String>>,
}

impl Default for ScriptedFileApi {
    fn default() -> Self {
        Self {
            upload: Script::new("/file/upload"),
            list: Script::new("/files"),
            delete: Script::new("/files"),
            uploaded: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedFileApi {
    /// Queue a response for `upload`.
    #[must_use]
    pub fn then_upload(self, step: Step<UploadFileResponse>) -> Self {
        self.upload.push(step);
        self
    }

    /// Queue a response for `list`.
    #[must_use]
    pub fn then_list(self, step: Step<Vec<FileRecord>>) -> Self {
        self.list.push(step);
        self
    }

    /// Queue a response for `delete`.
    #[must_use]
    pub fn then_delete(self, step: Step<AckResponse>) -> Self {
        self.delete.push(step);
        self
    }

    /// Number of `list` calls so far.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.list.calls()
    }

    /// Number of `upload` calls so far.
    #[must_use]
    pub fn upload_calls(&self) -> usize {
        self.upload.calls()
    }

    /// Names of files passed to `upload`.
    #[must_use]
    pub fn uploaded_names(&self) -> Vec<String> {
        lock(&self.uploaded).clone()
    }
}

#[async_trait]
impl FileApi for ScriptedFileApi {
    async fn upload(&self, upload: FileUpload) -> ApiResult<UploadFileResponse> {
        lock(&self.uploaded).push(upload.file_name);
        self.upload.next().await
    }

    async fn list(&self) -> ApiResult<Vec<FileRecord>> {
        self.list.next().await
    }

    async fn delete(&self, _file_id: &str) -> ApiResult<AckResponse> {
        self.delete.next().await
    }
}

/// Scripted [`AuthApi`].
#[derive(Debug)]
pub struct ScriptedAuthApi {
    clients: Script<Vec<ClientOrg>>,
    login: Script<LoginResponse>,
    register: Script<RegisterResponse>,
}

impl Default for ScriptedAuthApi {
    fn default() -> Self {
        Self {
            clients: Script::new("/clients"),
            login: Script::new("/user/login"),
            register: Script::new("/user/register"),
        }
    }
}

impl ScriptedAuthApi {
    /// Queue a response for `list_clients`.
    #[must_use]
    pub fn then_clients(self, step: Step<Vec<ClientOrg>>) -> Self {
        self.clients.push(step);
        self
    }

    /// Queue a response for `login`.
    #[must_use]
    pub fn then_login(self, step: Step<LoginResponse>) -> Self {
        self.login.push(step);
        self
    }

    /// Queue a response for either registration endpoint.
    #[must_use]
    pub fn then_register(self, step: Step<RegisterResponse>) -> Self {
        self.register.push(step);
        self
    }

    /// Number of `login` calls so far.
    #[must_use]
    pub fn login_calls(&self) -> usize {
        self.login.calls()
    }
}

#[async_trait]
impl AuthApi for ScriptedAuthApi {
    async fn list_clients(&self) -> ApiResult<Vec<ClientOrg>> {
        self.clients.next().await
    }

    async fn login(&self, _request: &LoginRequest) -> ApiResult<LoginResponse> {
        self.login.next().await
    }

    async fn register_user(&self, _request: &RegisterUserRequest) -> ApiResult<RegisterResponse> {
        self.register.next().await
    }

    async fn register_client(
        &self,
        _request: &RegisterClientRequest,
    ) -> ApiResult<RegisterResponse> {
        self.register.next().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn last_step_repeats_after_queue_drains() {
        let api = ScriptedWorkerApi::default()
            .then(Step::server_error())
            .then(Step::ok(WorkerListResponse::default()));
        assert!(api.list_workers().await.is_err());
        assert!(api.list_workers().await.is_ok());
        assert!(api.list_workers().await.is_ok());
        assert_eq!(api.calls(), 3);
    }

    #[test]
    fn memory_store_counts_writes() -> StorageResult<()> {
        let store = MemorySessionStore::default();
        store.save(&StoredSession::with_token("t"))?;
        store.clear()?;
        assert_eq!((store.saves(), store.clears()), (1, 1));
        assert_eq!(store.load()?, None);
        store.fail_writes();
        assert!(store.save(&StoredSession::with_token("t")).is_err());
        Ok(())
    }
}
