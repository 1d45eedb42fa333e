//! Console context, store wiring and CLI errors.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use anyhow::anyhow;
use taskgrid_client::{
    ApiClient, ClientService, CookieSettings, DualSessionStore, FileService, TaskService,
    WorkerService,
};
use taskgrid_config::{ConfigError, ConsoleConfig};
use taskgrid_core::{Notifier, SessionStore, SystemClock};
use taskgrid_store::{AuthStore, FileStore, StoreContext, StoreError, TaskStore, WorkerStore};
use taskgrid_telemetry::Metrics;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cli::OutputFormat;

/// CLI-level error type separating bad input, operational failures and
/// failures the operator has already been told about.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
    Reported,
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
            Self::Reported => 4,
        }
    }

    /// Message for stderr, `None` when a notice already covered it.
    pub(crate) fn display_message(&self) -> Option<String> {
        match self {
            Self::Validation(message) => Some(message.clone()),
            Self::Failure(error) => Some(format!("{error:#}")),
            Self::Reported => None,
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Validation(err.detail())
    }
}

/// Everything a command handler needs: configuration, the shared HTTP client
/// and the signed-in session.
pub(crate) struct AppContext {
    pub(crate) config: ConsoleConfig,
    pub(crate) output: OutputFormat,
    pub(crate) metrics: Option<Metrics>,
    pub(crate) auth: AuthStore,
    client: ApiClient,
    stores: StoreContext,
    expiry_listener: JoinHandle<()>,
}

impl AppContext {
    /// Wire the HTTP client, session storage and auth store from `config`.
    pub(crate) fn new(
        config: ConsoleConfig,
        output: OutputFormat,
        notifier: Arc<dyn Notifier>,
        metrics: Option<Metrics>,
    ) -> CliResult<Self> {
        let session: Arc<dyn SessionStore> = Arc::new(DualSessionStore::in_dir(
            &config.session_dir,
            CookieSettings {
                domain: config.cookie_domain.clone(),
                ttl_days: config.cookie_ttl_days,
            },
        ));
        let client = ApiClient::new(
            config.api_base_url.clone(),
            config.request_timeout,
            Arc::clone(&session),
        )
        .map_err(|err| CliError::failure(anyhow!("failed to build API client: {err}")))?;

        let mut stores = StoreContext::new(Arc::new(SystemClock), notifier);
        if let Some(metrics) = &metrics {
            stores = stores.with_metrics(metrics.clone());
        }

        let auth = AuthStore::new(
            Arc::new(ClientService::new(client.clone())),
            session,
            stores.clone(),
        );
        let restored = auth.init_auth();
        debug!(restored, session_dir = %config.session_dir.display(), "console initialised");
        let expiry_listener = auth.watch_session_events(client.subscribe_session_events());

        Ok(Self {
            config,
            output,
            metrics,
            auth,
            client,
            stores,
            expiry_listener,
        })
    }

    pub(crate) fn worker_store(&self) -> WorkerStore {
        WorkerStore::new(
            Arc::new(WorkerService::new(self.client.clone())),
            self.stores.clone(),
        )
    }

    pub(crate) fn task_store(&self) -> TaskStore {
        TaskStore::new(
            Arc::new(TaskService::new(self.client.clone())),
            self.stores.clone(),
        )
    }

    pub(crate) fn file_store(&self) -> FileStore {
        FileStore::new(
            Arc::new(FileService::new(self.client.clone())),
            self.stores.clone(),
        )
    }

    /// Map a store failure. Stores surface their own notices; an expired
    /// session is reported through the auth store, exactly once.
    pub(crate) fn reported(&self, err: &StoreError) -> CliError {
        if err.is_session_expired() {
            self.auth.expire();
        }
        debug!(error = %err, kind = ?err.kind(), "command failed");
        CliError::Reported
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.expiry_listener.abort();
    }
}
