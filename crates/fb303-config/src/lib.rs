//! Shared configuration for the fb303 management server and control utility.
//!
//! Values are layered by [`ortho_config`]: built-in defaults, then a
//! configuration file (`--config-path` or `FB303_CONFIG_PATH`), then `FB303_*`
//! environment variables, then command-line flags. Both binaries load the same
//! [`Config`] so the daemon and its clients agree on the socket endpoint.

use std::ffi::OsString;
use std::sync::Arc;
use std::time::Duration;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;
mod socket;

pub use defaults::{
    DEFAULT_DRAIN_TIMEOUT_MS, DEFAULT_LOG_FILTER, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_TCP_HOST,
    DEFAULT_TCP_PORT, default_drain_timeout_ms, default_log_filter, default_log_filter_string,
    default_log_format, default_request_timeout_ms, default_service_name,
    default_service_version, default_socket_endpoint,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved configuration shared by `fb303d` and `fb303-ctl`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "FB303")]
pub struct Config {
    /// Socket the management server listens on and clients connect to.
    #[ortho_config(default = default_socket_endpoint())]
    pub daemon_socket: SocketEndpoint,
    /// Name returned by `getName`.
    #[ortho_config(default = default_service_name())]
    pub service_name: String,
    /// Version returned by `getVersion`.
    #[ortho_config(default = default_service_version())]
    pub service_version: String,
    /// `tracing` filter directive for the daemon.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for daemon logs.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// How long a client waits for a response, in milliseconds.
    #[ortho_config(default = default_request_timeout_ms())]
    pub request_timeout_ms: u64,
    /// How long the daemon waits for open connections to finish after a
    /// shutdown request, in milliseconds.
    #[ortho_config(default = default_drain_timeout_ms())]
    pub drain_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daemon_socket: default_socket_endpoint(),
            service_name: default_service_name(),
            service_version: default_service_version(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            request_timeout_ms: default_request_timeout_ms(),
            drain_timeout_ms: default_drain_timeout_ms(),
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns the aggregated loader error when any layer is malformed.
    pub fn load_from_env() -> Result<Self, Arc<OrthoError>> {
        Self::load()
    }

    /// Loads configuration from an explicit argument list (first item is the
    /// program name) layered over the environment.
    ///
    /// # Errors
    ///
    /// Returns the aggregated loader error when any layer is malformed.
    pub fn load_from_args<I, T>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::load_from_iter(args)
    }

    /// Socket endpoint of the management server.
    #[must_use]
    pub const fn daemon_socket(&self) -> &SocketEndpoint {
        &self.daemon_socket
    }

    /// Service name reported over the wire.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Service version reported over the wire.
    #[must_use]
    pub fn service_version(&self) -> &str {
        &self.service_version
    }

    /// Log filter directive.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Client response timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Server drain budget after shutdown.
    #[must_use]
    pub const fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}
