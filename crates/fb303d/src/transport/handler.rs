//! Connection handling abstractions and line framing.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use thiserror::Error;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

/// Stream types accepted by the listener.
pub(crate) enum ConnectionStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl ConnectionStream {
    /// Bounds each blocking read so idle connections can poll for shutdown.
    pub(crate) fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.set_read_timeout(timeout),
            #[cfg(unix)]
            Self::Unix(stream) => stream.set_read_timeout(timeout),
        }
    }
}

impl Read for ConnectionStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for ConnectionStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

/// Handles accepted socket connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Handles a single connection. Implementations should avoid panicking.
    fn handle(&self, stream: ConnectionStream);
}

/// Result of waiting for the next request line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Frame {
    /// A complete line, without its terminator.
    Line(Vec<u8>),
    /// The read timed out before a full line arrived.
    Idle,
    /// The peer closed the connection with nothing buffered.
    Closed,
}

/// Framing failures; both end the connection.
#[derive(Debug, Error)]
pub(crate) enum FrameError {
    #[error("request exceeds maximum size of {max_bytes} bytes")]
    TooLarge { max_bytes: usize },
    #[error("failed to read request: {0}")]
    Io(#[from] io::Error),
}

/// Splits a byte stream into newline-terminated frames, keeping bytes that
/// arrive after a terminator for the next call.
#[derive(Debug)]
pub(crate) struct FrameReader {
    buffer: Vec<u8>,
    max_bytes: usize,
}

impl FrameReader {
    pub(crate) const fn new(max_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_bytes,
        }
    }

    pub(crate) fn next_frame<R: Read>(&mut self, reader: &mut R) -> Result<Frame, FrameError> {
        let mut chunk = [0_u8; 1024];
        loop {
            if let Some(line) = self.buffered_frame()? {
                return Ok(Frame::Line(line));
            }
            self.enforce_limit(self.buffer.len())?;

            match reader.read(&mut chunk) {
                Ok(0) if self.buffer.is_empty() => return Ok(Frame::Closed),
                // A final line without a terminator still counts as a frame.
                Ok(0) => return Ok(Frame::Line(std::mem::take(&mut self.buffer))),
                Ok(read) => self.buffer.extend_from_slice(&chunk[..read]),
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error)
                    if matches!(
                        error.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    return Ok(Frame::Idle);
                }
                Err(error) => return Err(FrameError::Io(error)),
            }
        }
    }

    /// Takes the next complete line that has already been read, without
    /// touching the stream.
    pub(crate) fn buffered_frame(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        let Some(position) = self.buffer.iter().position(|byte| *byte == b'\n') else {
            return Ok(None);
        };
        let mut line: Vec<u8> = self.buffer.drain(..=position).collect();
        line.pop();
        self.enforce_limit(line.len())?;
        Ok(Some(line))
    }

    fn enforce_limit(&self, size: usize) -> Result<(), FrameError> {
        if size > self.max_bytes {
            return Err(FrameError::TooLarge {
                max_bytes: self.max_bytes,
            });
        }
        Ok(())
    }
}
