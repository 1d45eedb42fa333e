//! Outbound HTTP wrapper shared by every service module.
//!
//! # Design
//! - One `reqwest::Client` per console with a request-id header and a timeout.
//! - The bearer token is read from the session store before every request so a
//!   login or logout is visible to the very next call.
//! - Response statuses are classified here and nowhere else. A 401 outside the
//!   auth endpoints clears stored credentials and broadcasts
//!   [`SessionEvent::Expired`] so the front end can return to its login screen.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use taskgrid_api_models::ErrorBody;
use taskgrid_core::SessionStore;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Header carrying the per-console request identifier.
pub const HEADER_REQUEST_ID: &str = "x-request-id";

const SESSION_EVENT_CAPACITY: usize = 16;

/// Session-level signals raised by the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The backend rejected the stored token; credentials were cleared and the
    /// operator must log in again.
    Expired,
}

/// Authenticated HTTP client bound to one API base URL.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: Client,
    base_url: Url,
    session: Arc<dyn SessionStore>,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    /// Build a client for `base_url` (for example `http://localhost:8080/api`).
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot carry path segments or the
    /// underlying HTTP client cannot be constructed.
    pub fn new(
        base_url: Url,
        timeout: Duration,
        session: Arc<dyn SessionStore>,
    ) -> ApiResult<Self> {
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl {
                url: base_url.to_string(),
            });
        }

        let mut default_headers = HeaderMap::new();
        let request_id = HeaderValue::from_str(&Uuid::new_v4().to_string()).map_err(|_| {
            ApiError::InvalidBaseUrl {
                url: base_url.to_string(),
            }
        })?;
        default_headers.insert(HEADER_REQUEST_ID, request_id);

        let http = Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|source| ApiError::ClientBuild { source })?;
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url,
                session,
                events,
            }),
        })
    }

    /// Base URL every endpoint is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Durable session store consulted for the bearer token.
    #[must_use]
    pub fn session_store(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.inner.session)
    }

    /// Subscribe to session signals raised by response classification.
    #[must_use]
    pub fn subscribe_session_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> ApiResult<T> {
        let url = self.endpoint(segments)?;
        self.execute(segments, self.inner.http.get(url)).await
    }

    pub(crate) async fn post_json<B, T>(&self, segments: &[&str], body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        self.execute(segments, self.inner.http.post(url).json(body))
            .await
    }

    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        form: Form,
    ) -> ApiResult<T> {
        let url = self.endpoint(segments)?;
        self.execute(segments, self.inner.http.post(url).multipart(form))
            .await
    }

    pub(crate) async fn delete_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> ApiResult<T> {
        let url = self.endpoint(segments)?;
        self.execute(segments, self.inner.http.delete(url)).await
    }

    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Endpoint {
                path: endpoint_label(segments),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.inner.session.load() {
            Ok(Some(session)) if session.has_token() => request.bearer_auth(&session.token),
            Ok(_) => request,
            Err(err) => {
                warn!(error = %err, "session read failed; sending request without credentials");
                request
            }
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        request: RequestBuilder,
    ) -> ApiResult<T> {
        let label = endpoint_label(segments);
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|source| ApiError::transport(&label, source))?;

        let status = response.status();
        debug!(endpoint = %label, status = status.as_u16(), "api response");
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|source| ApiError::Decode {
                    endpoint: label,
                    source,
                });
        }
        Err(self.classify(label, response).await)
    }

    async fn classify(&self, endpoint: String, response: Response) -> ApiError {
        let status = response.status();
        let bytes = response.bytes().await.unwrap_or_default();
        let body = serde_json::from_slice::<ErrorBody>(&bytes).unwrap_or_default();
        let message = body.detail().map(str::to_string);

        match status {
            StatusCode::UNAUTHORIZED if is_auth_endpoint(&endpoint) => {
                ApiError::InvalidCredentials { endpoint }
            }
            StatusCode::UNAUTHORIZED => {
                self.expire_session(&endpoint);
                ApiError::SessionExpired { endpoint }
            }
            StatusCode::FORBIDDEN => ApiError::Forbidden { endpoint },
            StatusCode::NOT_FOUND => ApiError::NotFound { endpoint },
            StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE => ApiError::Server { endpoint, status },
            _ => ApiError::Rejected {
                endpoint,
                status,
                message,
            },
        }
    }

    fn expire_session(&self, endpoint: &str) {
        warn!(endpoint, "session rejected by backend; clearing stored credentials");
        if let Err(err) = self.inner.session.clear() {
            warn!(error = %err, "failed to clear stored session after expiry");
        }
        if self.inner.events.send(SessionEvent::Expired).is_err() {
            debug!("no session listeners registered");
        }
    }
}

fn endpoint_label(segments: &[&str]) -> String {
    format!("/{}", segments.join("/"))
}

fn is_auth_endpoint(endpoint: &str) -> bool {
    endpoint.contains("/login") || endpoint.contains("/register")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_endpoints_are_detected_by_path() {
        assert!(is_auth_endpoint("/user/login"));
        assert!(is_auth_endpoint("/client/register"));
        assert!(is_auth_endpoint("/user/register"));
        assert!(!is_auth_endpoint("/workers/status"));
        assert!(!is_auth_endpoint("/files/abc"));
    }

    #[test]
    fn endpoint_label_joins_segments() {
        assert_eq!(endpoint_label(&["task", "status", "t-1"]), "/task/status/t-1");
    }
}
