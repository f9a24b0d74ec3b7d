//! Socket transport helpers for the control client.
//!
//! The functions here establish connections to the management server's TCP
//! or Unix socket and wrap the resulting streams in a uniform [`Connection`]
//! so that request handling can remain transport agnostic.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use fb303_config::SocketEndpoint;

#[cfg(unix)]
use std::os::fd::OwnedFd;
#[cfg(unix)]
use std::os::unix::net::UnixStream;

#[cfg(unix)]
use socket2::{Domain, SockAddr, Socket, Type};

pub(crate) enum Connection {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Connection {
    pub(crate) fn set_read_timeout(&self, timeout: Duration) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.set_read_timeout(Some(timeout)),
            #[cfg(unix)]
            Self::Unix(stream) => stream.set_read_timeout(Some(timeout)),
        }
    }

    pub(crate) fn set_write_timeout(&self, timeout: Duration) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.set_write_timeout(Some(timeout)),
            #[cfg(unix)]
            Self::Unix(stream) => stream.set_write_timeout(Some(timeout)),
        }
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Connection {
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

/// Opens a connection to `endpoint`, giving up after `timeout`.
pub(crate) fn connect(endpoint: &SocketEndpoint, timeout: Duration) -> io::Result<Connection> {
    match endpoint {
        SocketEndpoint::Tcp { host, port } => {
            let address = resolve_tcp_address(host, *port)?;
            TcpStream::connect_timeout(&address, timeout).map(Connection::Tcp)
        }
        SocketEndpoint::Unix { path } => connect_unix(path.as_str(), timeout),
    }
}

fn resolve_tcp_address(host: &str, port: u16) -> io::Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses"))
}

#[cfg(unix)]
fn connect_unix(path: &str, timeout: Duration) -> io::Result<Connection> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path)?;
    socket.connect_timeout(&address, timeout)?;
    let stream = UnixStream::from(OwnedFd::from(socket));
    Ok(Connection::Unix(stream))
}

#[cfg(not(unix))]
fn connect_unix(path: &str, _timeout: Duration) -> io::Result<Connection> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("platform does not support Unix sockets: {path}"),
    ))
}

#[cfg(all(test, unix))]
mod tests {
    use std::io::{BufRead, BufReader};
    use std::os::unix::net::UnixListener;
    use std::thread;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn unix_connections_carry_bytes_both_ways() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("fb303.sock");
        let listener = UnixListener::bind(&path).expect("bind");
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            reader.read_line(&mut line).expect("read");
            reader.get_mut().write_all(line.as_bytes()).expect("echo");
        });

        let endpoint = SocketEndpoint::unix(path.to_str().expect("utf-8 path").to_owned());
        let mut connection = connect(&endpoint, Duration::from_secs(2)).expect("connect");
        assert!(matches!(connection, Connection::Unix(_)));
        connection.write_all(b"ping\n").expect("write");
        connection
            .set_read_timeout(Duration::from_secs(2))
            .expect("read timeout");
        let mut echoed = String::new();
        BufReader::new(&mut connection)
            .read_line(&mut echoed)
            .expect("read echo");
        assert_eq!(echoed, "ping\n");
        server.join().expect("server thread");
    }

    #[test]
    fn missing_unix_socket_is_an_error() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("absent.sock");
        let endpoint = SocketEndpoint::unix(path.to_str().expect("utf-8 path").to_owned());
        assert!(connect(&endpoint, Duration::from_millis(200)).is_err());
    }
}
