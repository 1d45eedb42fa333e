//! Auth store: the one owner of the in-memory session.
//!
//! # Design
//! - A session is either absent or carries a non-empty token; [`AuthState`]
//!   cannot express anything in between.
//! - Durable storage is written before in-memory state, so the HTTP layer sees
//!   the new token on the very next request.
//! - Logout is local. The backend invalidates stale tokens on its own and the
//!   HTTP layer reports that through [`SessionEvent::Expired`].

use std::sync::{Arc, Weak};

use serde::Serialize;
use taskgrid_api_models::{ClientOrg, LoginRequest, RegisterClientRequest, RegisterUserRequest};
use taskgrid_client::{AuthApi, SessionEvent};
use taskgrid_core::{Notice, SessionStore, StoredSession};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::context::StoreContext;
use crate::error::{StoreError, StoreResult};

const STORE: &str = "auth";

/// Signed-in operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    /// Bearer token, never empty.
    #[serde(skip_serializing)]
    pub token: String,
    /// Name shown in the console header.
    pub display_name: Option<String>,
    /// Organisation of the operator.
    pub client_id: Option<String>,
    /// Operator identifier.
    pub user_id: Option<String>,
}

impl Session {
    /// Session restored from storage, `None` without a usable token.
    #[must_use]
    pub fn from_stored(stored: StoredSession) -> Option<Self> {
        stored.has_token().then(|| Self {
            token: stored.token,
            display_name: stored.display_name,
            client_id: stored.client_id,
            user_id: stored.user_id,
        })
    }

    fn to_stored(&self) -> StoredSession {
        StoredSession {
            token: self.token.clone(),
            display_name: self.display_name.clone(),
            client_id: self.client_id.clone(),
            user_id: self.user_id.clone(),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

/// Observable state of the auth store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthState {
    /// Present iff the operator is authenticated.
    pub session: Option<Session>,
}

impl AuthState {
    /// Whether a session is present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Current bearer token.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.token.as_str())
    }

    /// Current display name.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.session
            .as_ref()
            .and_then(|session| session.display_name.as_deref())
    }
}

/// Cheap handle over the shared auth state.
#[derive(Clone)]
pub struct AuthStore {
    inner: Arc<Inner>,
}

struct Inner {
    api: Arc<dyn AuthApi>,
    storage: Arc<dyn SessionStore>,
    context: StoreContext,
    state: watch::Sender<AuthState>,
}

impl AuthStore {
    /// Store backed by `api` and persisting to `storage`.
    #[must_use]
    pub fn new(
        api: Arc<dyn AuthApi>,
        storage: Arc<dyn SessionStore>,
        context: StoreContext,
    ) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self {
            inner: Arc::new(Inner {
                api,
                storage,
                context,
                state,
            }),
        }
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    /// Clone of the current state.
    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    /// Restore the session from durable storage. Never fails: unreadable or
    /// empty storage leaves the operator signed out. Returns whether a session
    /// was restored.
    pub fn init_auth(&self) -> bool {
        let session = match self.inner.storage.load() {
            Ok(stored) => stored.and_then(Session::from_stored),
            Err(err) => {
                warn!(store = STORE, error = %err, "session restore failed");
                None
            }
        };
        let restored = session.is_some();
        debug!(store = STORE, restored, "session initialised");
        self.inner.state.send_replace(AuthState { session });
        restored
    }

    /// Exchange credentials for a session.
    ///
    /// # Errors
    ///
    /// Returns the classified failure after one notice; the state is unchanged.
    pub async fn login(&self, request: &LoginRequest) -> StoreResult<Session> {
        let response = self.inner.api.login(request).await;
        let outcome = response.map_err(StoreError::from).and_then(|response| {
            self.establish(
                "login",
                Session {
                    token: response.token,
                    display_name: non_empty(response.display_name),
                    client_id: non_empty(response.client_id),
                    user_id: non_empty(response.user_id),
                },
            )
        });
        self.conclude(outcome, "Login successful")
    }

    /// Register a user inside an existing organisation and sign in.
    ///
    /// # Errors
    ///
    /// Returns the classified failure after one notice; the state is unchanged.
    pub async fn register(&self, request: &RegisterUserRequest) -> StoreResult<Session> {
        let response = self.inner.api.register_user(request).await;
        let outcome = response.map_err(StoreError::from).and_then(|response| {
            self.establish(
                "register",
                Session {
                    token: response.token,
                    display_name: non_empty(request.display_name.clone()),
                    client_id: non_empty(response.client_id),
                    user_id: non_empty(response.user_id),
                },
            )
        });
        self.conclude(outcome, "Registration successful")
    }

    /// Register a new organisation with its first account and sign in.
    ///
    /// # Errors
    ///
    /// Returns the classified failure after one notice; the state is unchanged.
    pub async fn register_client(&self, request: &RegisterClientRequest) -> StoreResult<Session> {
        let response = self.inner.api.register_client(request).await;
        let outcome = response.map_err(StoreError::from).and_then(|response| {
            self.establish(
                "register_client",
                Session {
                    token: response.token,
                    display_name: non_empty(request.username.clone()),
                    client_id: non_empty(response.client_id),
                    user_id: non_empty(response.user_id),
                },
            )
        });
        self.conclude(outcome, "Registration successful")
    }

    /// Clear durable storage and sign out. No backend call is made.
    pub fn logout(&self) {
        self.clear_storage();
        self.inner.state.send_replace(AuthState::default());
        info!(store = STORE, "logged out");
        self.inner.context.notify(Notice::info("Logged out"));
    }

    /// Drop the session after the backend rejected its token. The expiry
    /// notice is shown once, on the transition out of the signed-in state.
    pub fn expire(&self) {
        self.clear_storage();
        let was_authenticated = self.inner.state.send_if_modified(|state| state.session.take().is_some());
        if was_authenticated {
            warn!(store = STORE, "session expired");
            self.inner.context.notify(Notice::error(
                "Your session has expired, please log in again",
            ));
        }
    }

    /// Expire the session whenever the HTTP layer reports it. The listener
    /// ends when the sender closes or the store is dropped.
    #[must_use]
    pub fn watch_session_events(
        &self,
        mut events: broadcast::Receiver<SessionEvent>,
    ) -> JoinHandle<()> {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            loop {
                let event = events.recv().await;
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                match event {
                    Ok(SessionEvent::Expired) => Self { inner }.expire(),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(store = STORE, skipped, "session events lagged");
                        Self { inner }.expire();
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        })
    }

    /// Organisations offered by the registration form.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure after one notice.
    pub async fn list_clients(&self) -> StoreResult<Vec<ClientOrg>> {
        self.inner.api.list_clients().await.map_err(|source| {
            let err = StoreError::from(source);
            self.inner.context.report_fetch_failure(STORE, &err, false);
            err
        })
    }

    fn establish(&self, operation: &'static str, session: Session) -> StoreResult<Session> {
        if session.token.trim().is_empty() {
            return Err(StoreError::MissingToken { operation });
        }
        self.inner.storage.save(&session.to_stored())?;
        self.inner.state.send_replace(AuthState {
            session: Some(session.clone()),
        });
        info!(store = STORE, operation, "session established");
        Ok(session)
    }

    fn conclude(&self, outcome: StoreResult<Session>, success: &str) -> StoreResult<Session> {
        match &outcome {
            Ok(_) => self.inner.context.notify(Notice::success(success)),
            Err(err) => {
                warn!(store = STORE, error = %err, kind = ?err.kind(), "authentication failed");
                self.inner.context.notify(Notice::error(err.user_message()));
            }
        }
        outcome
    }

    fn clear_storage(&self) {
        if let Err(err) = self.inner.storage.clear() {
            warn!(store = STORE, error = %err, "session storage clear failed");
        }
    }
}
