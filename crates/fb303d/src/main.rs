use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match fb303d::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(io::stderr(), "fb303d: {error}");
            ExitCode::FAILURE
        }
    }
}
