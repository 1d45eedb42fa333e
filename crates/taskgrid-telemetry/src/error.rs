//! Error types for telemetry operations.

use thiserror::Error;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Step of metric setup that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricStage {
    /// Constructing the collector.
    Build,
    /// Adding the collector to the registry.
    Register,
}

/// Errors raised by telemetry helpers.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Another global subscriber was installed first.
    #[error("failed to install tracing subscriber")]
    SubscriberInstall {
        /// Underlying tracing subscriber error.
        #[source]
        source: tracing_subscriber::util::TryInitError,
    },
    /// A poll metric could not be set up.
    #[error("failed to set up poll metric")]
    MetricSetup {
        /// Metric name.
        name: &'static str,
        /// Setup step that failed.
        stage: MetricStage,
        /// Underlying Prometheus error.
        #[source]
        source: prometheus::Error,
    },
    /// Text exposition could not be produced.
    #[error("failed to render metrics")]
    Render {
        /// Encoder error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn metric_setup_keeps_name_and_source() {
        let err = TelemetryError::MetricSetup {
            name: "poll_ticks_total",
            stage: MetricStage::Register,
            source: prometheus::Error::AlreadyReg,
        };
        assert_eq!(err.to_string(), "failed to set up poll metric");
        assert!(err.source().is_some());
        assert!(matches!(
            err,
            TelemetryError::MetricSetup {
                stage: MetricStage::Register,
                ..
            }
        ));
    }

    #[test]
    fn render_failures_wrap_utf8_errors() {
        let Err(utf8) = String::from_utf8(vec![0, 159]) else {
            unreachable!("invalid utf-8 must fail");
        };
        let err = TelemetryError::Render {
            source: Box::new(utf8),
        };
        assert_eq!(err.to_string(), "failed to render metrics");
        assert!(err.source().is_some());
    }
}
