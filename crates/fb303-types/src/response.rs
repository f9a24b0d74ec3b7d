//! Responses returned by the management server.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};
use thiserror::Error;

use crate::ServiceStatus;

/// Success payload, typed per command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Reply {
    /// Name, version, status details, or an option value.
    Text(String),
    /// Current lifecycle status.
    Status(ServiceStatus),
    /// A counter value or the alive-since timestamp.
    Integer(i64),
    /// Snapshot of every counter.
    Counters(BTreeMap<String, i64>),
    /// Snapshot of every option.
    Options(BTreeMap<String, String>),
    /// Commands that return nothing.
    Unit,
}

/// Category of a failed request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Unknown counter or option key.
    NotFound,
    /// Malformed arguments, such as an empty name.
    InvalidArgument,
    /// The lifecycle state forbids the operation.
    InvalidState,
    /// The service has not become alive yet.
    NotReady,
    /// The request frame could not be decoded.
    Protocol,
    /// The command is not part of the protocol.
    UnsupportedCommand,
    /// The server failed internally.
    Internal,
}

/// Structured error carried in a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    /// Error category.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl RemoteError {
    /// Builds a remote error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Success or failure of a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The command succeeded.
    Ok {
        /// Typed payload.
        reply: Reply,
    },
    /// The command failed.
    Error {
        /// Failure description.
        error: RemoteError,
    },
}

/// Response envelope.
///
/// `id` echoes the request id. It is `None` only when the request could not
/// be decoded far enough to read one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Correlation id of the answered request.
    pub id: Option<u64>,
    /// Result of the request.
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Response {
    /// Builds a success response.
    #[must_use]
    pub const fn ok(id: u64, reply: Reply) -> Self {
        Self {
            id: Some(id),
            outcome: Outcome::Ok { reply },
        }
    }

    /// Builds an error response.
    #[must_use]
    pub const fn error(id: Option<u64>, error: RemoteError) -> Self {
        Self {
            id,
            outcome: Outcome::Error { error },
        }
    }

    /// Converts the outcome into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns the carried [`RemoteError`] for error responses.
    pub fn into_result(self) -> Result<Reply, RemoteError> {
        match self.outcome {
            Outcome::Ok { reply } => Ok(reply),
            Outcome::Error { error } => Err(error),
        }
    }

    /// Serialises the response as a single newline-terminated JSON line.
    ///
    /// # Errors
    ///
    /// Returns the serialisation error from `serde_json`.
    pub fn to_line(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}
