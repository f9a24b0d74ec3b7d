//! Response framing for the dispatch loop.

use std::io::Write;

use fb303_types::{Reply, Response};

use super::errors::DispatchError;

/// Writes one JSONL response line per request and flushes it immediately so
/// pipelined clients see answers in order.
pub(crate) struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    pub(crate) const fn new(writer: W) -> Self {
        Self { writer }
    }

    pub(crate) fn write_response(&mut self, response: &Response) -> Result<(), DispatchError> {
        let line = response.to_line()?;
        self.writer.write_all(&line)?;
        self.writer.flush()?;
        Ok(())
    }

    pub(crate) fn write_reply(&mut self, id: u64, reply: Reply) -> Result<(), DispatchError> {
        self.write_response(&Response::ok(id, reply))
    }

    pub(crate) fn write_error(
        &mut self,
        id: Option<u64>,
        error: &DispatchError,
    ) -> Result<(), DispatchError> {
        self.write_response(&Response::error(id, error.to_remote()))
    }
}
