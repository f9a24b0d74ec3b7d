//! Request decoding for the dispatch loop.
//!
//! Decoding happens in stages so each failure maps to the right wire error:
//! a frame that is not a JSON object with a numeric `id` and a string
//! `command` is a protocol error; an unrecognised command name is reported as
//! unsupported; a recognised command with bad arguments is an argument error.

use fb303_types::{CommandName, Request};
use serde_json::{Map, Value};

use super::errors::DispatchError;

/// A frame that could not be turned into a [`Request`].
#[derive(Debug)]
pub(crate) struct RejectedRequest {
    /// Request id, when the frame got far enough to carry one.
    pub(crate) id: Option<u64>,
    pub(crate) error: DispatchError,
}

impl RejectedRequest {
    const fn new(id: Option<u64>, error: DispatchError) -> Self {
        Self { id, error }
    }
}

/// Decodes a single request line (without its terminator).
pub(crate) fn decode_request(line: &[u8]) -> Result<Request, RejectedRequest> {
    let trimmed = line.trim_ascii();
    if trimmed.is_empty() {
        return Err(RejectedRequest::new(
            None,
            DispatchError::malformed("empty request line"),
        ));
    }

    let value: Value = serde_json::from_slice(trimmed)
        .map_err(|error| RejectedRequest::new(None, DispatchError::from_json_error(error)))?;
    let Value::Object(fields) = value else {
        return Err(RejectedRequest::new(
            None,
            DispatchError::malformed("request must be a JSON object"),
        ));
    };

    let id = request_id(&fields)?;
    let name = command_name(&fields)?;
    let command = CommandName::parse(name).map_err(|_| {
        RejectedRequest::new(Some(id), DispatchError::unsupported_command(name))
    })?;

    serde_json::from_value::<Request>(Value::Object(fields)).map_err(|error| {
        RejectedRequest::new(
            Some(id),
            DispatchError::invalid_arguments(command.as_str(), error.to_string()),
        )
    })
}

fn request_id(fields: &Map<String, Value>) -> Result<u64, RejectedRequest> {
    fields.get("id").and_then(Value::as_u64).ok_or_else(|| {
        RejectedRequest::new(
            None,
            DispatchError::malformed("request id must be a non-negative integer"),
        )
    })
}

fn command_name(fields: &Map<String, Value>) -> Result<&str, RejectedRequest> {
    fields
        .get("command")
        .and_then(Value::as_str)
        .ok_or_else(|| RejectedRequest::new(None, DispatchError::malformed("missing command name")))
}
