//! CLI entrypoint for the fb303 control utility.
//!
//! The binary delegates to [`fb303_ctl::run`], which loads configuration,
//! parses the host, port and command tokens, and issues each command to the
//! management server.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    fb303_ctl::run(std::env::args_os(), &mut stdout, &mut stderr)
}
