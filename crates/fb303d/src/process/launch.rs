//! Supervises launch sequencing and runtime orchestration.

use std::sync::Arc;

use tracing::info;

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::server::{DrainReport, ManagementServer};
use crate::service::ServiceError;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Collaborators required to launch the server runtime.
pub(crate) struct LaunchPlan<L, S> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) shutdown: S,
}

/// Runs the management server in the foreground with the production
/// collaborators, returning once it has stopped.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap, binding, or the shutdown sequence
/// fails.
pub fn run_daemon() -> Result<(), LaunchError> {
    let plan = LaunchPlan {
        loader: SystemConfigLoader,
        reporter: Arc::new(StructuredHealthReporter::new()),
        shutdown: SystemShutdownSignal::new(),
    };
    run_daemon_with(plan).map(|_| ())
}

/// Runs the server with injected collaborators.
pub(crate) fn run_daemon_with<L, S>(plan: LaunchPlan<L, S>) -> Result<DrainReport, LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan {
        loader,
        reporter,
        shutdown,
    } = plan;

    let daemon = bootstrap_with(&loader, reporter)?;
    let config = daemon.config();
    let service = Arc::clone(daemon.service());

    let server = ManagementServer::bind(config.daemon_socket(), Arc::clone(&service))?;
    let running = server.start()?;
    service.mark_alive()?;
    info!(
        target: PROCESS_TARGET,
        endpoint = %config.daemon_socket(),
        address = ?running.local_addr(),
        service = service.name(),
        started_at = service.started_at(),
        "management server ready"
    );

    let request = shutdown.wait(&service)?;
    if !service.status().is_shutting_down() {
        match service.mark_stopping(request) {
            Ok(()) | Err(ServiceError::InvalidState { .. }) => {}
            Err(error) => return Err(error.into()),
        }
    }

    let report = running.stop(config.drain_timeout())?;
    info!(
        target: PROCESS_TARGET,
        cause = %request,
        abandoned = report.abandoned_connections,
        "shutdown sequence completed"
    );
    Ok(report)
}
