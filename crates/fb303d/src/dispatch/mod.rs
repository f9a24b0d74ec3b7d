//! JSONL request dispatch for management commands.
//!
//! This module reads [`fb303_types::Request`] frames from connected clients,
//! routes them to the [`crate::service::ManagementService`] and writes one
//! [`fb303_types::Response`] per request. The dispatcher plugs into the
//! transport layer through the `ConnectionHandler` trait.
//!
//! ## Protocol
//!
//! Each request is one JSON object per line:
//!
//! ```json
//! {"id":7,"command":"get_counter","key":"requests"}
//! ```
//!
//! and is answered by exactly one line carrying the same id:
//!
//! ```json
//! {"id":7,"outcome":"ok","reply":{"type":"integer","value":42}}
//! {"id":7,"outcome":"error","error":{"kind":"not_found","message":"unknown counter 'requests'"}}
//! ```
//!
//! A connection may carry any number of requests; responses follow request
//! order.

mod errors;
mod handler;
mod request;
mod response;
mod router;

pub use self::errors::DispatchError;
pub(crate) use self::handler::DispatchConnectionHandler;
