use crate::logging::LogFormat;
use crate::socket::SocketEndpoint;

/// Default host the management server binds to.
pub const DEFAULT_TCP_HOST: &str = "127.0.0.1";

/// Default management port; matches the port scribe-style services expose
/// their fb303 interface on.
pub const DEFAULT_TCP_PORT: u16 = 1463;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default client response timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

/// Default server drain budget in milliseconds.
pub const DEFAULT_DRAIN_TIMEOUT_MS: u64 = 10_000;

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Computes the default socket endpoint for the management server.
#[must_use]
pub fn default_socket_endpoint() -> SocketEndpoint {
    SocketEndpoint::tcp(DEFAULT_TCP_HOST, DEFAULT_TCP_PORT)
}

/// Default name reported by `getName`.
#[must_use]
pub fn default_service_name() -> String {
    String::from("fb303d")
}

/// Default version reported by `getVersion`.
#[must_use]
pub fn default_service_version() -> String {
    String::from(env!("CARGO_PKG_VERSION"))
}

/// Default client response timeout in milliseconds.
#[must_use]
pub const fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

/// Default server drain budget in milliseconds.
#[must_use]
pub const fn default_drain_timeout_ms() -> u64 {
    DEFAULT_DRAIN_TIMEOUT_MS
}
