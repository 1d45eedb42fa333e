//! User-facing notices (the toast/message surface of a front end).
//!
//! # Design
//! - Stores decide *whether* to surface a failure; the notifier only renders it.
//! - Silent background failures never reach a notifier, only `tracing`.

use std::fmt::{self, Display, Formatter};

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Operation completed.
    Success,
    /// Neutral information.
    Info,
    /// Operation failed.
    Error,
}

impl NoticeLevel {
    /// Short label used by text front ends.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Success => "ok",
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

/// A message intended for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Rendered message.
    pub message: String,
}

impl Notice {
    /// Success notice.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    /// Informational notice.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    /// Error notice.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl Display for Notice {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: {}", self.level.label(), self.message)
    }
}

/// Renders notices to the operator.
pub trait Notifier: Send + Sync {
    /// Surface one notice.
    fn notify(&self, notice: Notice);
}

/// Notifier that forwards notices to `tracing`, for headless embedding.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => tracing::error!(message = %notice.message, "notice"),
            NoticeLevel::Success | NoticeLevel::Info => {
                tracing::info!(message = %notice.message, "notice");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_display_prefixes_level() {
        assert_eq!(Notice::error("boom").to_string(), "error: boom");
        assert_eq!(Notice::success("done").to_string(), "ok: done");
        assert_eq!(Notice::info("bye").to_string(), "info: bye");
    }
}
