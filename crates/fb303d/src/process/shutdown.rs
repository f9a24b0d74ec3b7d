use std::io;
use std::sync::mpsc::RecvError;
use std::thread::{self, JoinHandle};

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::{info, warn};

use crate::service::{ManagementService, ShutdownRequest};

use super::PROCESS_TARGET;

/// Abstraction over shutdown notification mechanisms.
pub(crate) trait ShutdownSignal: Send + Sync {
    /// Blocks until the service should stop and reports why.
    fn wait(&self, service: &ManagementService) -> Result<ShutdownRequest, ShutdownError>;
}

/// Errors reported by shutdown listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The signal forwarding thread could not be spawned.
    #[error("failed to spawn signal forwarder: {source}")]
    Spawn {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Another caller already owns the service's shutdown receiver.
    #[error("shutdown requests are already being consumed elsewhere")]
    ReceiverTaken,
    /// Every sender was dropped before a request arrived.
    #[error("shutdown channel closed: {source}")]
    Disconnected {
        /// Underlying channel error.
        #[source]
        source: RecvError,
    },
}

/// Waits for a termination signal or a remote `shutdown` command, whichever
/// comes first.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct SystemShutdownSignal;

impl SystemShutdownSignal {
    /// Builds a signal listener.
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self, service: &ManagementService) -> Result<ShutdownRequest, ShutdownError> {
        let requests = service
            .shutdown_requests()
            .ok_or(ShutdownError::ReceiverTaken)?;
        let mut signals = Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP])
            .map_err(|source| ShutdownError::Install { source })?;
        let signals_handle = signals.handle();
        let sender = service.shutdown_sender();
        let forwarder = thread::Builder::new()
            .name(String::from("fb303-signals"))
            .spawn(move || {
                if let Some(signal) = signals.forever().next() {
                    let _ = sender.send(ShutdownRequest::Signal(signal));
                }
            })
            .map_err(|source| ShutdownError::Spawn { source })?;

        let request = requests.recv();
        signals_handle.close();
        join_forwarder(forwarder);
        let request = request.map_err(|source| ShutdownError::Disconnected { source })?;
        info!(
            target: PROCESS_TARGET,
            cause = %request,
            "shutdown request received"
        );
        Ok(request)
    }
}

/// Reaps the signal forwarding thread; a panic there must not abort the
/// shutdown sequence.
fn join_forwarder(forwarder: JoinHandle<()>) {
    if forwarder.join().is_err() {
        warn!(target: PROCESS_TARGET, "signal forwarding thread panicked");
    }
}
