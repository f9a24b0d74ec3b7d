//! Wire types shared by the fb303 management server and its control client.
//!
//! Requests and responses travel as single JSON lines. A request names one of
//! the fixed management commands; a response carries either a typed reply or a
//! structured error. Both `fb303d` and `fb303-ctl` depend on this crate so the
//! two sides cannot drift apart.

mod command;
mod response;
mod status;

pub use command::{Command, CommandName, Request, UnknownCommand};
pub use response::{ErrorKind, Outcome, RemoteError, Reply, Response};
pub use status::{ServiceStatus, UnknownStatusCode};

/// Maximum size in bytes of a single request or response line.
pub const MAX_FRAME_BYTES: usize = 64 * 1024;
