//! Error types for request dispatch failures.
//!
//! Each variant maps to one wire [`ErrorKind`]. Only framing failures end the
//! connection; argument and service errors are answered and the connection
//! keeps serving.

use std::io;

use fb303_types::{ErrorKind, RemoteError};
use thiserror::Error;

use crate::service::ServiceError;

/// Errors surfaced during request decoding and dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The frame is not a JSON request object.
    #[error("malformed request: {message}")]
    Malformed {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The frame exceeds the size limit.
    #[error("request exceeds the {max_size} byte limit")]
    RequestTooLarge { max_size: usize },

    /// The command name is not part of the protocol.
    #[error("unsupported command '{command}'")]
    UnsupportedCommand { command: String },

    /// A known command carried missing or mistyped arguments.
    #[error("invalid arguments for '{command}': {message}")]
    InvalidArguments { command: String, message: String },

    /// The service rejected the command.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// IO error during read or write.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Response serialisation failed.
    #[error("failed to serialise response: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl DispatchError {
    /// Creates a malformed-request error from a serde error.
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::Malformed {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed-request error with a custom message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an unsupported-command error.
    pub fn unsupported_command(command: impl Into<String>) -> Self {
        Self::UnsupportedCommand {
            command: command.into(),
        }
    }

    /// Creates an invalid-arguments error.
    pub fn invalid_arguments(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Wire category reported to the client.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Malformed { .. } | Self::RequestTooLarge { .. } => ErrorKind::Protocol,
            Self::UnsupportedCommand { .. } => ErrorKind::UnsupportedCommand,
            Self::InvalidArguments { .. } => ErrorKind::InvalidArgument,
            Self::Service(error) => error.kind(),
            Self::Io(_) | Self::Serialize(_) => ErrorKind::Internal,
        }
    }

    /// Whether the connection must close after reporting this error.
    pub fn closes_connection(&self) -> bool {
        matches!(
            self,
            Self::Malformed { .. }
                | Self::RequestTooLarge { .. }
                | Self::Io(_)
                | Self::Serialize(_)
        )
    }

    /// Structured form sent in the response.
    pub fn to_remote(&self) -> RemoteError {
        RemoteError::new(self.kind(), self.to_string())
    }
}
