//! fb303-style management server.
//!
//! A service embeds [`ManagementService`] to expose its name, version,
//! lifecycle status, counters and runtime options, and serves them to
//! control clients through a [`ManagementServer`] bound to a TCP or Unix
//! socket configured via [`fb303_config`]. The `fb303d` binary wraps the same
//! pieces in a foreground process: [`run_daemon`] loads configuration,
//! initialises structured telemetry, starts the service, serves requests
//! until a termination signal or a remote `shutdown`, drains open
//! connections and exits.
//!
//! ## Lifecycle
//!
//! ```text
//! DEAD -> STARTING -> ALIVE <-> WARNING
//!                      |           |
//!                      +-> STOPPING <+ -> STOPPED
//! ```
//!
//! `reinitialize` cycles an `ALIVE` or `WARNING` service through `STARTING`
//! and back. The first `STARTING -> ALIVE` transition stamps the
//! alive-since timestamp, which never changes afterwards.

mod bootstrap;
mod dispatch;
mod health;
mod process;
mod server;
mod service;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use dispatch::DispatchError;
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, ShutdownError, run_daemon};
pub use server::{DrainReport, ManagementServer, RunningServer, ServerError};
pub use service::{
    Clock, ManagementService, ServiceError, ServiceIdentity, ShutdownRequest, SystemClock,
};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
