//! Test double for [`HealthReporter`] that records lifecycle events for
//! assertions.

use std::sync::Mutex;

use fb303_config::Config;
use fb303_types::ServiceStatus;

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;
use crate::server::DrainReport;
use crate::service::ShutdownRequest;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Bootstrap completed successfully.
    BootstrapSucceeded,
    /// Bootstrap failed with an error description.
    BootstrapFailed(String),
    /// The service moved between two statuses.
    StatusChanged {
        from: ServiceStatus,
        to: ServiceStatus,
    },
    /// The service entered `STOPPING`.
    ShutdownRequested(ShutdownRequest),
    /// Connection draining finished.
    DrainCompleted { abandoned: usize },
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Statuses the service entered, in order.
    #[must_use]
    pub fn statuses(&self) -> Vec<ServiceStatus> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HealthEvent::StatusChanged { to, .. } => Some(to),
                _ => None,
            })
            .collect()
    }

    pub fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn status_changed(&self, from: ServiceStatus, to: ServiceStatus) {
        self.record(HealthEvent::StatusChanged { from, to });
    }

    fn shutdown_requested(&self, request: ShutdownRequest) {
        self.record(HealthEvent::ShutdownRequested(request));
    }

    fn drain_completed(&self, report: &DrainReport) {
        self.record(HealthEvent::DrainCompleted {
            abandoned: report.abandoned_connections,
        });
    }
}
