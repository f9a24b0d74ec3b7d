//! Blocking client for the management protocol.
//!
//! [`ControlClient`] opens a fresh connection for every call, writes a single
//! JSONL request and waits for the matching response line until the
//! configured timeout elapses. Every typed method maps the reply onto the
//! value the command promises and reports any other reply shape as a
//! [`ClientError::Protocol`].

use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use thiserror::Error;

use fb303_config::{Config, SocketEndpoint};
use fb303_types::{
    Command, CommandName, ErrorKind, MAX_FRAME_BYTES, Outcome, RemoteError, Reply, Request,
    Response, ServiceStatus,
};

use crate::transport::{Connection, connect};

const READ_CHUNK_BYTES: usize = 4096;

/// Errors reported by [`ControlClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// No response arrived before the deadline.
    #[error("timed out after {timeout:?} waiting for {endpoint}")]
    Timeout {
        /// Server endpoint.
        endpoint: String,
        /// Configured request timeout.
        timeout: Duration,
    },
    /// Connecting, writing or reading failed, or the server hung up.
    #[error("transport failure talking to {endpoint}: {source}")]
    Transport {
        /// Server endpoint.
        endpoint: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The server answered with something the client cannot interpret.
    #[error("protocol violation: {message}")]
    Protocol {
        /// Description of the violation.
        message: String,
    },
    /// The server rejected the request.
    #[error("server rejected the request: {0}")]
    Remote(#[from] RemoteError),
}

impl ClientError {
    /// Wire error kind when the server rejected the request.
    #[must_use]
    pub const fn remote_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Remote(error) => Some(error.kind),
            _ => None,
        }
    }

    fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    fn unexpected_reply(command: CommandName, reply: &Reply) -> Self {
        Self::protocol(format!("unexpected reply {reply:?} to {}", command.as_str()))
    }
}

/// Client for one management server endpoint.
#[derive(Debug)]
pub struct ControlClient {
    endpoint: SocketEndpoint,
    timeout: Duration,
    next_id: AtomicU64,
}

impl ControlClient {
    /// Builds a client that waits at most `timeout` for each call.
    #[must_use]
    pub const fn new(endpoint: SocketEndpoint, timeout: Duration) -> Self {
        Self {
            endpoint,
            timeout,
            next_id: AtomicU64::new(1),
        }
    }

    /// Builds a client for the configured socket and request timeout.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.daemon_socket().clone(), config.request_timeout())
    }

    /// Endpoint this client talks to.
    #[must_use]
    pub const fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// Per-call timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends `command` and returns the untyped reply.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the call times out, the transport fails,
    /// the response cannot be decoded or does not answer this request, or the
    /// server rejects the command.
    pub fn call(&self, command: Command) -> Result<Reply, ClientError> {
        let deadline = Instant::now() + self.timeout;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let line = Request::new(id, command)
            .to_line()
            .map_err(|error| ClientError::protocol(format!("failed to encode request: {error}")))?;

        let mut connection =
            connect(&self.endpoint, self.timeout).map_err(|error| self.io_failure(error))?;
        self.send(&mut connection, &line, deadline)?;
        let frame = self.receive(&mut connection, deadline)?;

        let response: Response = serde_json::from_slice(&frame)
            .map_err(|error| ClientError::protocol(format!("undecodable response: {error}")))?;
        match response.id {
            Some(answered) if answered != id => Err(ClientError::protocol(format!(
                "response id {answered} does not match request id {id}"
            ))),
            None if matches!(response.outcome, Outcome::Ok { .. }) => Err(ClientError::protocol(
                "successful response carried no request id",
            )),
            _ => Ok(response.into_result()?),
        }
    }

    /// Service name.
    ///
    /// # Errors
    ///
    /// See [`ControlClient::call`].
    pub fn name(&self) -> Result<String, ClientError> {
        self.text(Command::GetName)
    }

    /// Service version.
    ///
    /// # Errors
    ///
    /// See [`ControlClient::call`].
    pub fn version(&self) -> Result<String, ClientError> {
        self.text(Command::GetVersion)
    }

    /// Current lifecycle status.
    ///
    /// # Errors
    ///
    /// See [`ControlClient::call`].
    pub fn status(&self) -> Result<ServiceStatus, ClientError> {
        match self.call(Command::GetStatus)? {
            Reply::Status(status) => Ok(status),
            other => Err(ClientError::unexpected_reply(CommandName::GetStatus, &other)),
        }
    }

    /// Human-readable status detail.
    ///
    /// # Errors
    ///
    /// See [`ControlClient::call`].
    pub fn status_details(&self) -> Result<String, ClientError> {
        self.text(Command::GetStatusDetails)
    }

    /// Snapshot of every counter.
    ///
    /// # Errors
    ///
    /// See [`ControlClient::call`].
    pub fn counters(&self) -> Result<BTreeMap<String, i64>, ClientError> {
        match self.call(Command::GetCounters)? {
            Reply::Counters(counters) => Ok(counters),
            other => Err(ClientError::unexpected_reply(CommandName::GetCounters, &other)),
        }
    }

    /// Value of one counter.
    ///
    /// # Errors
    ///
    /// See [`ControlClient::call`]; an unknown counter is a remote
    /// `not_found` error.
    pub fn counter(&self, key: &str) -> Result<i64, ClientError> {
        self.integer(Command::GetCounter {
            key: key.to_owned(),
        })
    }

    /// Sets a runtime option.
    ///
    /// # Errors
    ///
    /// See [`ControlClient::call`].
    pub fn set_option(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.unit(Command::SetOption {
            key: key.to_owned(),
            value: value.to_owned(),
        })
    }

    /// Value of one runtime option.
    ///
    /// # Errors
    ///
    /// See [`ControlClient::call`]; an unset option is a remote `not_found`
    /// error.
    pub fn option(&self, key: &str) -> Result<String, ClientError> {
        self.text(Command::GetOption {
            key: key.to_owned(),
        })
    }

    /// Snapshot of every runtime option.
    ///
    /// # Errors
    ///
    /// See [`ControlClient::call`].
    pub fn options(&self) -> Result<BTreeMap<String, String>, ClientError> {
        match self.call(Command::GetOptions)? {
            Reply::Options(options) => Ok(options),
            other => Err(ClientError::unexpected_reply(CommandName::GetOptions, &other)),
        }
    }

    /// Unix timestamp at which the service first became alive.
    ///
    /// # Errors
    ///
    /// See [`ControlClient::call`]; a service that has not become alive yet
    /// answers with `not_ready`.
    pub fn alive_since(&self) -> Result<i64, ClientError> {
        self.integer(Command::AliveSince)
    }

    /// Asks the service to reload its configuration.
    ///
    /// # Errors
    ///
    /// See [`ControlClient::call`].
    pub fn reinitialize(&self) -> Result<(), ClientError> {
        self.unit(Command::Reinitialize)
    }

    /// Asks the service to stop.
    ///
    /// # Errors
    ///
    /// See [`ControlClient::call`].
    pub fn shutdown(&self) -> Result<(), ClientError> {
        self.unit(Command::Shutdown)
    }

    fn text(&self, command: Command) -> Result<String, ClientError> {
        let name = command.name();
        match self.call(command)? {
            Reply::Text(text) => Ok(text),
            other => Err(ClientError::unexpected_reply(name, &other)),
        }
    }

    fn integer(&self, command: Command) -> Result<i64, ClientError> {
        let name = command.name();
        match self.call(command)? {
            Reply::Integer(value) => Ok(value),
            other => Err(ClientError::unexpected_reply(name, &other)),
        }
    }

    fn unit(&self, command: Command) -> Result<(), ClientError> {
        let name = command.name();
        match self.call(command)? {
            Reply::Unit => Ok(()),
            other => Err(ClientError::unexpected_reply(name, &other)),
        }
    }

    fn send(
        &self,
        connection: &mut Connection,
        line: &[u8],
        deadline: Instant,
    ) -> Result<(), ClientError> {
        let remaining = self.remaining(deadline)?;
        connection
            .set_write_timeout(remaining)
            .map_err(|error| self.io_failure(error))?;
        connection
            .write_all(line)
            .and_then(|()| connection.flush())
            .map_err(|error| self.io_failure(error))
    }

    fn receive(
        &self,
        connection: &mut Connection,
        deadline: Instant,
    ) -> Result<Vec<u8>, ClientError> {
        let mut frame = Vec::new();
        let mut chunk = [0_u8; READ_CHUNK_BYTES];
        loop {
            let remaining = self.remaining(deadline)?;
            connection
                .set_read_timeout(remaining)
                .map_err(|error| self.io_failure(error))?;
            let read = match connection.read(&mut chunk) {
                Ok(0) => {
                    return Err(self.io_failure(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed before a response arrived",
                    )));
                }
                Ok(read) => read,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(self.io_failure(error)),
            };
            let received = chunk.get(..read).unwrap_or_default();
            if let Some(end) = received.iter().position(|byte| *byte == b'\n') {
                frame.extend_from_slice(received.get(..end).unwrap_or_default());
                return Ok(frame);
            }
            frame.extend_from_slice(received);
            if frame.len() > MAX_FRAME_BYTES {
                return Err(ClientError::protocol(format!(
                    "response exceeds {MAX_FRAME_BYTES} bytes"
                )));
            }
        }
    }

    fn remaining(&self, deadline: Instant) -> Result<Duration, ClientError> {
        deadline
            .checked_duration_since(Instant::now())
            .filter(|remaining| !remaining.is_zero())
            .ok_or_else(|| self.timed_out())
    }

    fn timed_out(&self) -> ClientError {
        ClientError::Timeout {
            endpoint: self.endpoint.to_string(),
            timeout: self.timeout,
        }
    }

    fn io_failure(&self, source: io::Error) -> ClientError {
        match source.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => self.timed_out(),
            _ => ClientError::Transport {
                endpoint: self.endpoint.to_string(),
                source,
            },
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
