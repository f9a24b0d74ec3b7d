//! Connection handler that serves a stream of management requests.
//!
//! `DispatchConnectionHandler` implements the transport's
//! `ConnectionHandler` trait. Each connection runs a loop: read one frame,
//! decode it, route it to the service and write the response. Framing
//! failures are answered with a protocol error and end the connection; every
//! other failure is answered and the loop continues. Once the service is
//! stopping, requests that already arrived on the connection are still
//! answered in order (mutating ones fail with `invalid_state`) and then the
//! connection closes. Idle connections notice the same condition through a
//! short read timeout.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use fb303_types::MAX_FRAME_BYTES;
use tracing::{debug, warn};

use crate::service::ManagementService;
use crate::transport::{ConnectionHandler, ConnectionStream, Frame, FrameError, FrameReader};

use super::errors::DispatchError;
use super::request::decode_request;
use super::response::ResponseWriter;
use super::router::{CommandRouter, DISPATCH_TARGET};

/// How often an idle connection re-checks whether the service is stopping.
pub(crate) const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// What the loop does after a frame has been answered.
enum Next {
    Continue,
    Close,
}

/// Connection handler that decodes and dispatches management commands.
#[derive(Debug)]
pub(crate) struct DispatchConnectionHandler {
    router: CommandRouter,
    service: Arc<ManagementService>,
}

impl DispatchConnectionHandler {
    pub(crate) fn new(service: Arc<ManagementService>) -> Self {
        Self {
            router: CommandRouter::new(Arc::clone(&service)),
            service,
        }
    }

    fn serve(&self, mut stream: ConnectionStream) {
        if let Err(error) = stream.set_read_timeout(Some(IDLE_POLL_INTERVAL)) {
            warn!(target: DISPATCH_TARGET, %error, "failed to set read timeout");
            return;
        }

        let mut frames = FrameReader::new(MAX_FRAME_BYTES);
        loop {
            let next = match frames.next_frame(&mut stream) {
                Ok(Frame::Line(line)) if line.trim_ascii().is_empty() => Next::Continue,
                Ok(Frame::Line(line)) => self.answer(&line, &mut stream),
                Ok(Frame::Idle) => Next::Continue,
                Ok(Frame::Closed) => {
                    debug!(target: DISPATCH_TARGET, "client closed connection");
                    Next::Close
                }
                Err(error) => reject_frame(&error, &mut stream),
            };

            if matches!(next, Next::Close) {
                break;
            }
            if self.service.status().is_shutting_down() {
                self.answer_buffered(&mut frames, &mut stream);
                break;
            }
        }
    }

    /// Answers every complete request already read from the connection.
    fn answer_buffered(&self, frames: &mut FrameReader, stream: &mut ConnectionStream) {
        loop {
            let next = match frames.buffered_frame() {
                Ok(Some(line)) if line.trim_ascii().is_empty() => Next::Continue,
                Ok(Some(line)) => self.answer(&line, stream),
                Ok(None) => Next::Close,
                Err(error) => reject_frame(&error, stream),
            };
            if matches!(next, Next::Close) {
                return;
            }
        }
    }

    fn answer<W: Write>(&self, line: &[u8], stream: &mut W) -> Next {
        let mut writer = ResponseWriter::new(stream);
        let request = match decode_request(line) {
            Ok(request) => request,
            Err(rejected) => {
                warn!(
                    target: DISPATCH_TARGET,
                    error = %rejected.error,
                    "rejected request"
                );
                let written = writer.write_error(rejected.id, &rejected.error);
                return if rejected.error.closes_connection() || written.is_err() {
                    Next::Close
                } else {
                    Next::Continue
                };
            }
        };

        let written = match self.router.route(&request.command) {
            Ok(reply) => writer.write_reply(request.id, reply),
            Err(error) => {
                debug!(
                    target: DISPATCH_TARGET,
                    id = request.id,
                    command = request.command.name().as_str(),
                    %error,
                    "command failed"
                );
                writer.write_error(Some(request.id), &DispatchError::from(error))
            }
        };

        match written {
            Ok(()) => Next::Continue,
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "failed to write response");
                Next::Close
            }
        }
    }
}

fn reject_frame<W: Write>(error: &FrameError, stream: &mut W) -> Next {
    match error {
        FrameError::TooLarge { max_bytes } => {
            let error = DispatchError::RequestTooLarge {
                max_size: *max_bytes,
            };
            warn!(target: DISPATCH_TARGET, %error, "rejecting request");
            let _ = ResponseWriter::new(stream).write_error(None, &error);
        }
        FrameError::Io(error) => {
            warn!(target: DISPATCH_TARGET, %error, "failed to read request");
        }
    }
    Next::Close
}

impl ConnectionHandler for DispatchConnectionHandler {
    fn handle(&self, stream: ConnectionStream) {
        self.serve(stream);
    }
}
