//! Structured telemetry for the management server.
//!
//! The subscriber is process-global, so only the first bootstrap installs it.
//! Every module logs under its own `fb303d::<module>` target, which keeps
//! filters such as `fb303d::dispatch=debug` usable. Connection workers run on
//! named threads (`fb303-accept`, `fb303-conn`, `fb303-signals`) and the
//! thread name is part of every event.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, debug, info, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, time::UtcTime};

use fb303_config::{Config, LogFormat};

const TELEMETRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::telemetry");

/// Format of the subscriber installed by the first successful call.
static INSTALLED_FORMAT: OnceCell<LogFormat> = OnceCell::new();

/// Describes the subscriber serving this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
    installed_now: bool,
}

impl TelemetryHandle {
    /// Output format of the active subscriber.
    #[must_use]
    pub const fn format(&self) -> LogFormat {
        self.format
    }

    /// Whether this call installed the subscriber rather than finding one.
    #[must_use]
    pub const fn installed_now(&self) -> bool {
        self.installed_now
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global subscriber on first use and announces the service
/// identity through it.
///
/// Later calls keep the existing subscriber; a different `log_format` in
/// their configuration is reported at debug level and otherwise ignored.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    let mut installed_now = false;
    let format = *INSTALLED_FORMAT.get_or_try_init(|| {
        install_subscriber(config)?;
        installed_now = true;
        Ok::<_, TelemetryError>(config.log_format())
    })?;

    if installed_now {
        info!(
            target: TELEMETRY_TARGET,
            service = config.service_name(),
            version = config.service_version(),
            format = %format,
            filter = config.log_filter(),
            "telemetry initialised"
        );
    } else if format != config.log_format() {
        debug!(
            target: TELEMETRY_TARGET,
            active = %format,
            requested = %config.log_format(),
            "telemetry already installed; keeping the active format"
        );
    }

    Ok(TelemetryHandle {
        format,
        installed_now,
    })
}

fn build_filter(config: &Config) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(config.log_filter()).map_err(|error| TelemetryError::Filter(error.to_string()))
}

fn install_subscriber(config: &Config) -> Result<(), TelemetryError> {
    let filter = build_filter(config)?;

    let builder = |filter: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_thread_names(true)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .with_timer(UtcTime::rfc_3339())
    };

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(builder(filter).json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder(filter).compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}
