//! Socket listener for management endpoints.
//!
//! The transport module binds to the configured socket endpoint, accepts
//! connections on a background thread and serves each one on its own worker
//! thread. It also owns line framing so the dispatcher only sees whole
//! request frames.

mod errors;
mod handler;
mod listener;
#[cfg(test)]
mod test_utils;

pub use self::errors::ListenerError;
pub(crate) use self::handler::{
    ConnectionHandler, ConnectionStream, Frame, FrameError, FrameReader,
};
pub(crate) use self::listener::{ListenerHandle, SocketListener};
#[cfg(test)]
pub(crate) use self::test_utils::{CountingHandler, HoldingHandler};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
