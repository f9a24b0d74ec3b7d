//! The management service: identity, lifecycle, counters and options.
//!
//! [`ManagementService`] owns every piece of state the management protocol
//! exposes. It is shared between the listener's worker threads as an
//! `Arc<ManagementService>`; each store sits behind its own lock and lifecycle
//! transitions are serialised by a dedicated transition lock so that
//! `reinitialize` and `shutdown` never interleave.

mod clock;
mod counters;
mod errors;
mod options;
mod status;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fb303_types::ServiceStatus;
use tracing::{debug, info, warn};

use crate::health::HealthReporter;

pub use self::clock::{Clock, SystemClock};
pub use self::errors::ServiceError;

use self::clock::ServiceClock;
use self::counters::CounterStore;
use self::options::OptionStore;
use self::status::StatusRegistry;

const SERVICE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::service");

/// Why the service was asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownRequest {
    /// A client issued the `shutdown` command.
    Remote,
    /// The process received a termination signal.
    Signal(i32),
    /// The embedding host stopped the server directly.
    Host,
}

impl fmt::Display for ShutdownRequest {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote => formatter.write_str("remote shutdown command"),
            Self::Signal(signal) => write!(formatter, "signal {signal}"),
            Self::Host => formatter.write_str("host request"),
        }
    }
}

/// Name and version reported by `getName` and `getVersion`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    name: String,
    version: String,
}

impl ServiceIdentity {
    /// Builds an identity from its name and version.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Service version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}

/// State and lifecycle of a managed service.
pub struct ManagementService {
    identity: ServiceIdentity,
    status: StatusRegistry,
    counters: CounterStore,
    options: OptionStore,
    clock: ServiceClock,
    transitions: Mutex<()>,
    reporter: Arc<dyn HealthReporter>,
    shutdown_tx: Sender<ShutdownRequest>,
    shutdown_rx: Mutex<Option<Receiver<ShutdownRequest>>>,
}

impl fmt::Debug for ManagementService {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ManagementService")
            .field("identity", &self.identity)
            .field("status", &self.status.status())
            .finish_non_exhaustive()
    }
}

impl ManagementService {
    /// Creates a `DEAD` service reading time from the system clock.
    #[must_use]
    pub fn new(identity: ServiceIdentity, reporter: Arc<dyn HealthReporter>) -> Self {
        Self::with_clock(identity, reporter, Arc::new(SystemClock))
    }

    /// Creates a `DEAD` service with an explicit clock.
    #[must_use]
    pub fn with_clock(
        identity: ServiceIdentity,
        reporter: Arc<dyn HealthReporter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel();
        Self {
            identity,
            status: StatusRegistry::default(),
            counters: CounterStore::default(),
            options: OptionStore::default(),
            clock: ServiceClock::new(clock),
            transitions: Mutex::new(()),
            reporter,
            shutdown_tx,
            shutdown_rx: Mutex::new(Some(shutdown_rx)),
        }
    }

    fn transition_guard(&self) -> MutexGuard<'_, ()> {
        self.transitions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies a checked transition. Callers hold the transition lock.
    fn apply_transition(&self, next: ServiceStatus) -> Result<(), ServiceError> {
        let previous = self.status.transition(next)?;
        if previous == ServiceStatus::Starting && next == ServiceStatus::Alive {
            self.clock.mark_alive();
        }
        debug!(
            target: SERVICE_TARGET,
            from = %previous,
            to = %next,
            "status transition"
        );
        self.reporter.status_changed(previous, next);
        Ok(())
    }

    fn ensure_running(&self, operation: &'static str) -> Result<(), ServiceError> {
        let status = self.status.status();
        if status.is_shutting_down() {
            return Err(ServiceError::InvalidState { operation, status });
        }
        Ok(())
    }

    /// Configured service name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.identity.name()
    }

    /// Configured service version.
    #[must_use]
    pub fn version(&self) -> &str {
        self.identity.version()
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> ServiceStatus {
        self.status.status()
    }

    /// Current free-form status detail.
    #[must_use]
    pub fn status_details(&self) -> String {
        self.status.details()
    }

    /// Snapshot of every counter.
    #[must_use]
    pub fn counters(&self) -> BTreeMap<String, i64> {
        self.counters.snapshot()
    }

    /// Value of a single counter.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::CounterNotFound`] for a name never written and
    /// [`ServiceError::InvalidArgument`] for an empty name.
    pub fn counter(&self, key: &str) -> Result<i64, ServiceError> {
        self.counters.get(key)
    }

    /// Sets or replaces an option.
    ///
    /// # Errors
    ///
    /// Fails with [`ServiceError::InvalidArgument`] on an empty name and
    /// [`ServiceError::InvalidState`] once the service is stopping.
    pub fn set_option(&self, key: &str, value: &str) -> Result<(), ServiceError> {
        self.ensure_running("setOption")?;
        self.options.set(key, value)?;
        info!(target: SERVICE_TARGET, option = key, "option updated");
        Ok(())
    }

    /// Value of a single option.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::OptionNotFound`] when the option is unset.
    pub fn option(&self, key: &str) -> Result<String, ServiceError> {
        self.options.get(key)
    }

    /// Snapshot of every option.
    #[must_use]
    pub fn options(&self) -> BTreeMap<String, String> {
        self.options.snapshot()
    }

    /// Epoch second of the first `STARTING -> ALIVE` transition.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotReady`] before the service has been alive.
    pub fn alive_since(&self) -> Result<i64, ServiceError> {
        self.clock.alive_since().ok_or(ServiceError::NotReady)
    }

    /// Epoch second at which the service object was created.
    #[must_use]
    pub const fn started_at(&self) -> i64 {
        self.clock.started_at()
    }

    /// Cycles through `STARTING` back to `ALIVE` and clears the status detail.
    /// Counters, options and the alive-since stamp survive.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidState`] unless the service is `ALIVE`
    /// or `WARNING`.
    pub fn reinitialize(&self) -> Result<(), ServiceError> {
        let _guard = self.transition_guard();
        let status = self.status.status();
        if !matches!(status, ServiceStatus::Alive | ServiceStatus::Warning) {
            return Err(ServiceError::InvalidState {
                operation: "reinitialize",
                status,
            });
        }
        self.apply_transition(ServiceStatus::Starting)?;
        self.status.set_details(String::new());
        self.apply_transition(ServiceStatus::Alive)?;
        info!(target: SERVICE_TARGET, "service reinitialised");
        Ok(())
    }

    /// Moves to `STOPPING` and posts a remote stop request. Returns without
    /// waiting for connections to drain.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidState`] unless the service is `ALIVE`
    /// or `WARNING`.
    pub fn shutdown(&self) -> Result<(), ServiceError> {
        self.begin_shutdown(ShutdownRequest::Remote)
    }

    /// Moves to `STOPPING` on behalf of `request` and notifies whoever holds
    /// the shutdown receiver.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidState`] unless the service is `ALIVE`
    /// or `WARNING`.
    pub fn begin_shutdown(&self, request: ShutdownRequest) -> Result<(), ServiceError> {
        self.mark_stopping(request)?;
        if self.shutdown_tx.send(request).is_err() {
            warn!(
                target: SERVICE_TARGET,
                %request,
                "shutdown receiver is gone; nobody will drain the server"
            );
        }
        Ok(())
    }

    /// Moves to `STOPPING` on behalf of a request the caller is already
    /// handling, so nothing is posted on the shutdown channel.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidState`] unless the service is `ALIVE`
    /// or `WARNING`.
    pub fn mark_stopping(&self, request: ShutdownRequest) -> Result<(), ServiceError> {
        let _guard = self.transition_guard();
        let status = self.status.status();
        if !matches!(status, ServiceStatus::Alive | ServiceStatus::Warning) {
            return Err(ServiceError::InvalidState {
                operation: "shutdown",
                status,
            });
        }
        self.apply_transition(ServiceStatus::Stopping)?;
        self.reporter.shutdown_requested(request);
        Ok(())
    }

    /// `DEAD -> STARTING`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidTransition`] from any other status.
    pub fn start(&self) -> Result<(), ServiceError> {
        self.set_status(ServiceStatus::Starting)
    }

    /// `STARTING -> ALIVE`; stamps alive-since the first time.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidTransition`] from any other status.
    pub fn mark_alive(&self) -> Result<(), ServiceError> {
        self.set_status(ServiceStatus::Alive)
    }

    /// `STOPPING -> STOPPED`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidTransition`] from any other status.
    pub fn mark_stopped(&self) -> Result<(), ServiceError> {
        self.set_status(ServiceStatus::Stopped)
    }

    /// Applies any transition permitted by the lifecycle table, such as
    /// `ALIVE <-> WARNING`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidTransition`] when the table forbids the
    /// move.
    pub fn set_status(&self, next: ServiceStatus) -> Result<(), ServiceError> {
        let _guard = self.transition_guard();
        self.apply_transition(next)
    }

    /// Replaces the free-form status detail.
    pub fn set_status_details(&self, details: impl Into<String>) {
        self.status.set_details(details.into());
    }

    /// Adds `delta` to a counter, creating it at zero first if needed.
    ///
    /// # Errors
    ///
    /// Fails with [`ServiceError::InvalidArgument`] on an empty name or an
    /// overflowing sum, and [`ServiceError::InvalidState`] once stopping.
    pub fn increment_counter(&self, key: &str, delta: i64) -> Result<i64, ServiceError> {
        self.ensure_running("incrementCounter")?;
        self.counters.increment(key, delta)
    }

    /// Overwrites a counter.
    ///
    /// # Errors
    ///
    /// Fails with [`ServiceError::InvalidArgument`] on an empty name and
    /// [`ServiceError::InvalidState`] once stopping.
    pub fn set_counter(&self, key: &str, value: i64) -> Result<(), ServiceError> {
        self.ensure_running("setCounter")?;
        self.counters.set(key, value)
    }

    pub(crate) fn reporter(&self) -> &Arc<dyn HealthReporter> {
        &self.reporter
    }

    /// Sender half of the shutdown channel, for signal forwarding.
    #[must_use]
    pub fn shutdown_sender(&self) -> Sender<ShutdownRequest> {
        self.shutdown_tx.clone()
    }

    /// Hands out the shutdown receiver. Only the first call returns it.
    #[must_use]
    pub fn shutdown_requests(&self) -> Option<Receiver<ShutdownRequest>> {
        self.shutdown_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

#[cfg(test)]
mod tests;
