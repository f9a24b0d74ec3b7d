//! Structured health reporting for service lifecycle events.

use std::sync::Arc;

use fb303_config::Config;
use fb303_types::ServiceStatus;

use crate::bootstrap::BootstrapError;
use crate::server::DrainReport;
use crate::service::ShutdownRequest;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked after every accepted status transition.
    fn status_changed(&self, from: ServiceStatus, to: ServiceStatus);

    /// Invoked when the service enters `STOPPING`.
    fn shutdown_requested(&self, request: ShutdownRequest);

    /// Invoked once open connections have drained or the budget ran out.
    fn drain_completed(&self, report: &DrainReport);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn status_changed(&self, from: ServiceStatus, to: ServiceStatus) {
        (**self).status_changed(from, to);
    }

    fn shutdown_requested(&self, request: ShutdownRequest) {
        (**self).shutdown_requested(request);
    }

    fn drain_completed(&self, report: &DrainReport) {
        (**self).drain_completed(report);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting management server bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            socket = %config.daemon_socket(),
            service = config.service_name(),
            version = config.service_version(),
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            "management server bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "management server bootstrap failed"
        );
    }

    fn status_changed(&self, from: ServiceStatus, to: ServiceStatus) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "status_changed",
            from = %from,
            to = %to,
            code = to.code(),
            "service status changed"
        );
    }

    fn shutdown_requested(&self, request: ShutdownRequest) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "shutdown_requested",
            cause = %request,
            "service shutdown requested"
        );
    }

    fn drain_completed(&self, report: &DrainReport) {
        if report.is_clean() {
            tracing::info!(
                target: HEALTH_TARGET,
                event = "drain_completed",
                "connections drained"
            );
        } else {
            tracing::warn!(
                target: HEALTH_TARGET,
                event = "drain_completed",
                abandoned = report.abandoned_connections,
                "drain budget exhausted"
            );
        }
    }
}
