//! # Design
//!
//! - One error type for every outbound call, classified once by the HTTP layer.
//! - Display strings stay constant; endpoint/status live in fields.
//! - `user_message` is the single place that turns a failure into operator text.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Coarse failure taxonomy used to decide how a caller reacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input rejected by the backend; the operator can correct it.
    Validation,
    /// Credentials rejected or session expired.
    Auth,
    /// Caller lacks permission; retrying will not help.
    Authorization,
    /// Target resource does not exist.
    NotFound,
    /// Server or network trouble; the next poll tick is the retry.
    Transient,
    /// Client-side defect (bad endpoint, undecodable body).
    Internal,
}

/// Errors produced by [`crate::ApiClient`] and the service modules.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Login or registration rejected with 401.
    #[error("credentials rejected")]
    InvalidCredentials {
        /// Endpoint that rejected the credentials.
        endpoint: String,
    },
    /// A 401 outside the auth endpoints; stored credentials were cleared.
    #[error("session expired")]
    SessionExpired {
        /// Endpoint that reported the expiry.
        endpoint: String,
    },
    /// Request rejected with a client-error status other than 401/403/404.
    #[error("request rejected")]
    Rejected {
        /// Endpoint that rejected the request.
        endpoint: String,
        /// Response status.
        status: StatusCode,
        /// Backend-provided message, when present.
        message: Option<String>,
    },
    /// Request forbidden with 403.
    #[error("request forbidden")]
    Forbidden {
        /// Endpoint that refused the request.
        endpoint: String,
    },
    /// Resource missing (404).
    #[error("resource not found")]
    NotFound {
        /// Endpoint that returned 404.
        endpoint: String,
    },
    /// Backend failed with 500, 502 or 503.
    #[error("server unavailable")]
    Server {
        /// Endpoint that failed.
        endpoint: String,
        /// Response status.
        status: StatusCode,
    },
    /// Request timed out before a response arrived.
    #[error("request timed out")]
    Timeout {
        /// Endpoint being called.
        endpoint: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },
    /// Connection could not be established or was interrupted.
    #[error("network failure")]
    Network {
        /// Endpoint being called.
        endpoint: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },
    /// Request could not be built.
    #[error("request construction failed")]
    Request {
        /// Endpoint being called.
        endpoint: String,
        /// Underlying builder error.
        source: reqwest::Error,
    },
    /// Successful response carried an unexpected body.
    #[error("response decode failed")]
    Decode {
        /// Endpoint being called.
        endpoint: String,
        /// Underlying decode error.
        source: reqwest::Error,
    },
    /// Endpoint path could not be resolved against the base URL.
    #[error("invalid endpoint")]
    Endpoint {
        /// Path that failed to resolve.
        path: String,
    },
    /// Base URL cannot carry path segments.
    #[error("invalid base url")]
    InvalidBaseUrl {
        /// Offending URL.
        url: String,
    },
    /// HTTP client could not be constructed.
    #[error("failed to build http client")]
    ClientBuild {
        /// Underlying builder error.
        source: reqwest::Error,
    },
}

impl ApiError {
    pub(crate) fn transport(endpoint: &str, source: reqwest::Error) -> Self {
        let endpoint = endpoint.to_string();
        if source.is_timeout() {
            Self::Timeout { endpoint, source }
        } else if source.is_builder() {
            Self::Request { endpoint, source }
        } else {
            Self::Network { endpoint, source }
        }
    }

    /// Failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCredentials { .. } | Self::SessionExpired { .. } => ErrorKind::Auth,
            Self::Rejected { .. } => ErrorKind::Validation,
            Self::Forbidden { .. } => ErrorKind::Authorization,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Server { .. } | Self::Timeout { .. } | Self::Network { .. } => {
                ErrorKind::Transient
            }
            Self::Request { .. }
            | Self::Decode { .. }
            | Self::Endpoint { .. }
            | Self::InvalidBaseUrl { .. }
            | Self::ClientBuild { .. } => ErrorKind::Internal,
        }
    }

    /// HTTP status when the failure came from a response.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::InvalidCredentials { .. } | Self::SessionExpired { .. } => {
                Some(StatusCode::UNAUTHORIZED)
            }
            Self::Rejected { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::Forbidden { .. } => Some(StatusCode::FORBIDDEN),
            Self::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            _ => None,
        }
    }

    /// Message supplied by the backend, when it sent one.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Operator-facing text for this failure.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredentials { .. } => "Incorrect email or password".to_string(),
            Self::SessionExpired { .. } => {
                "Your session has expired, please log in again".to_string()
            }
            Self::Rejected {
                status, message, ..
            } => message
                .clone()
                .unwrap_or_else(|| rejected_fallback(*status).to_string()),
            Self::Forbidden { .. } => {
                "You do not have permission to perform this operation".to_string()
            }
            Self::NotFound { .. } => "The requested resource does not exist".to_string(),
            Self::Server { status, .. } => server_message(*status).to_string(),
            Self::Timeout { .. } => {
                "Request timed out, please check your network connection and retry".to_string()
            }
            Self::Network { .. } => {
                "Network connection failed, please check your connection".to_string()
            }
            Self::Request { .. }
            | Self::Decode { .. }
            | Self::Endpoint { .. }
            | Self::InvalidBaseUrl { .. }
            | Self::ClientBuild { .. } => "Request failed, please try again later".to_string(),
        }
    }
}

fn rejected_fallback(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "Invalid request parameters, please check your input",
        409 => "Resource conflict, please check and retry",
        422 => "Data validation failed",
        _ => "An unknown error occurred, please try again later",
    }
}

fn server_message(status: StatusCode) -> &'static str {
    match status.as_u16() {
        502 => "Gateway error, please try again later",
        503 => "Service temporarily unavailable, please try again later",
        _ => "Server error, please try again later",
    }
}
