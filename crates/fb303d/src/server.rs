//! Embeddable management server.
//!
//! [`ManagementServer`] binds the configured endpoint and serves the
//! management protocol for a shared [`ManagementService`]. Hosts that embed
//! the server drive the service lifecycle themselves; the `fb303d` binary
//! does so in [`crate::run_daemon`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use fb303_config::SocketEndpoint;
use fb303_types::ServiceStatus;

use crate::dispatch::DispatchConnectionHandler;
use crate::service::{ManagementService, ServiceError, ShutdownRequest};
use crate::transport::{ConnectionHandler, ListenerError, ListenerHandle, SocketListener};

/// Outcome of draining open connections after a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// Connections still open when the drain budget ran out.
    pub abandoned_connections: usize,
}

impl DrainReport {
    /// Whether every connection finished within the budget.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.abandoned_connections == 0
    }
}

/// Errors raised while running the management server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Binding or running the listener failed.
    #[error(transparent)]
    Listener(#[from] ListenerError),
    /// The service refused a lifecycle transition during stop.
    #[error("failed to finish shutdown: {0}")]
    Lifecycle(#[from] ServiceError),
}

/// A bound, not yet accepting, management server.
#[derive(Debug)]
pub struct ManagementServer {
    listener: SocketListener,
    service: Arc<ManagementService>,
}

impl ManagementServer {
    /// Binds `endpoint`. A TCP port of `0` picks a free port.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Listener`] when the socket cannot be bound.
    pub fn bind(
        endpoint: &SocketEndpoint,
        service: Arc<ManagementService>,
    ) -> Result<Self, ServerError> {
        let listener = SocketListener::bind(endpoint)?;
        Ok(Self { listener, service })
    }

    /// Bound TCP address; `None` for Unix sockets.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr()
    }

    /// Starts accepting connections on a background thread.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Listener`] when the accept thread cannot start.
    pub fn start(self) -> Result<RunningServer, ServerError> {
        let local_addr = self.listener.local_addr();
        let handler: Arc<dyn ConnectionHandler> =
            Arc::new(DispatchConnectionHandler::new(Arc::clone(&self.service)));
        let handle = self.listener.start(handler)?;
        Ok(RunningServer {
            handle,
            service: self.service,
            local_addr,
        })
    }
}

/// A server accepting connections.
pub struct RunningServer {
    handle: ListenerHandle,
    service: Arc<ManagementService>,
    local_addr: Option<SocketAddr>,
}

impl RunningServer {
    /// Bound TCP address; `None` for Unix sockets.
    #[must_use]
    pub const fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// The service this server exposes.
    #[must_use]
    pub const fn service(&self) -> &Arc<ManagementService> {
        &self.service
    }

    /// Number of connections currently being served.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.handle.connections().active()
    }

    /// Stops accepting, waits up to `drain_timeout` for open connections and
    /// moves the service to `STOPPED`.
    ///
    /// A service that is still running is moved to `STOPPING` first on
    /// behalf of the host.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the accept thread panicked or the final
    /// transition is refused.
    pub fn stop(self, drain_timeout: Duration) -> Result<DrainReport, ServerError> {
        if !self.service.status().is_shutting_down() {
            match self.service.mark_stopping(ShutdownRequest::Host) {
                Ok(()) | Err(ServiceError::InvalidState { .. }) => {}
                Err(error) => return Err(error.into()),
            }
        }

        let connections = self.handle.connections();
        self.handle.shutdown();
        self.handle.join()?;

        let abandoned_connections = connections.wait_for_idle(drain_timeout);
        let report = DrainReport {
            abandoned_connections,
        };
        self.service.reporter().drain_completed(&report);

        if self.service.status() == ServiceStatus::Stopping {
            self.service.mark_stopped()?;
        }
        Ok(report)
    }
}
