//! Scripted management server for client and CLI tests.
//!
//! The server accepts connections on an ephemeral TCP port, records each
//! request line and answers according to a caller-supplied script.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use fb303_config::SocketEndpoint;
use fb303_types::{Reply, Request, Response};

const ACCEPT_DEADLINE: Duration = Duration::from_secs(2);

/// What the fake server does with one request.
pub(crate) enum Answer {
    /// Write this line (a newline is appended).
    Line(String),
    /// Keep the connection open without answering until the client leaves.
    Silence,
    /// Close the connection without answering.
    Hangup,
}

type Script = dyn Fn(Option<Request>) -> Answer + Send + Sync;

pub(crate) struct FakeServer {
    port: u16,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeServer {
    /// Spawns a server that runs `script` for every request it receives.
    pub(crate) fn spawn<F>(script: F) -> Result<Self>
    where
        F: Fn(Option<Request>) -> Answer + Send + Sync + 'static,
    {
        let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind fake server")?;
        listener
            .set_nonblocking(true)
            .context("fake server nonblocking")?;
        let port = listener.local_addr().context("local addr")?.port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let script: Arc<Script> = Arc::new(script);
        thread::spawn(move || accept_loop(&listener, &recorded, &script));
        Ok(Self { port, requests })
    }

    /// Spawns a server that answers every request with `reply`.
    pub(crate) fn replying(reply: Reply) -> Result<Self> {
        Self::spawn(move |request| match request {
            Some(request) => Answer::Line(response_line(&Response::ok(request.id, reply.clone()))),
            None => Answer::Hangup,
        })
    }

    pub(crate) fn port(&self) -> u16 {
        self.port
    }

    pub(crate) fn endpoint(&self) -> SocketEndpoint {
        SocketEndpoint::tcp("127.0.0.1", self.port)
    }

    /// Request lines received so far, without their newline.
    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("fake server requests poisoned")
            .clone()
    }
}

/// Serialises `response` without the trailing newline.
pub(crate) fn response_line(response: &Response) -> String {
    serde_json::to_string(response).expect("serialise response")
}

fn accept_loop(listener: &TcpListener, requests: &Arc<Mutex<Vec<String>>>, script: &Arc<Script>) {
    let mut deadline = Instant::now() + ACCEPT_DEADLINE;
    while Instant::now() < deadline {
        match listener.accept() {
            Ok((stream, _)) => {
                deadline = Instant::now() + ACCEPT_DEADLINE;
                let requests = Arc::clone(requests);
                let script = Arc::clone(script);
                thread::spawn(move || {
                    let _ = serve(stream, &requests, &*script);
                });
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(10));
            }
            Err(_) => return,
        }
    }
}

fn serve(stream: TcpStream, requests: &Mutex<Vec<String>>, script: &Script) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(());
    }
    let trimmed = line.trim_end().to_owned();
    let request = serde_json::from_str::<Request>(&trimmed).ok();
    requests
        .lock()
        .expect("fake server requests poisoned")
        .push(trimmed);

    let mut writer = stream;
    match script(request) {
        Answer::Line(answer) => {
            writer.write_all(answer.as_bytes())?;
            writer.write_all(b"\n")?;
            writer.flush()
        }
        Answer::Silence => {
            let mut sink = Vec::new();
            reader.read_to_end(&mut sink).map(|_| ())
        }
        Answer::Hangup => Ok(()),
    }
}
