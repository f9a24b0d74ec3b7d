//! Errors raised by management operations.

use thiserror::Error;

use fb303_types::{ErrorKind, ServiceStatus};

/// Failure of a single management operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// No counter is registered under the requested name.
    #[error("unknown counter '{key}'")]
    CounterNotFound {
        /// Requested counter name.
        key: String,
    },
    /// No option is set under the requested name.
    #[error("option '{key}' is not set")]
    OptionNotFound {
        /// Requested option name.
        key: String,
    },
    /// An argument was rejected before touching any state.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument.
        message: String,
    },
    /// The lifecycle table forbids the requested status change.
    #[error("cannot move from {from} to {to}")]
    InvalidTransition {
        /// Status at the time of the request.
        from: ServiceStatus,
        /// Requested status.
        to: ServiceStatus,
    },
    /// The operation is not permitted in the current status.
    #[error("{operation} is not permitted while {status}")]
    InvalidState {
        /// Operation that was refused.
        operation: &'static str,
        /// Status at the time of the request.
        status: ServiceStatus,
    },
    /// The service has never been alive.
    #[error("service has not become alive yet")]
    NotReady,
}

impl ServiceError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Wire category for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::CounterNotFound { .. } | Self::OptionNotFound { .. } => ErrorKind::NotFound,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::InvalidTransition { .. } | Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::NotReady => ErrorKind::NotReady,
        }
    }
}

/// Rejects empty counter and option names.
pub(crate) fn validate_key(subject: &str, key: &str) -> Result<(), ServiceError> {
    if key.is_empty() {
        return Err(ServiceError::invalid_argument(format!(
            "{subject} name must not be empty"
        )));
    }
    Ok(())
}
