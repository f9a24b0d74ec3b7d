//! Control client and command-line utility for fb303 management servers.
//!
//! [`ControlClient`] speaks the JSONL management protocol defined in
//! [`fb303_types`]: one fresh connection per call, a per-client request id
//! and a deadline on every response. [`run`] implements the `fb303-ctl`
//! binary on top of it:
//!
//! ```text
//! fb303-ctl [--config-path PATH] [--request-timeout-ms MS] [--output human|json] \
//!     HOST PORT COMMAND...
//! ```
//!
//! Every command is attempted in order; the process exits with a failure
//! status when any of them failed.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind as ClapErrorKind;
use fb303_config::SocketEndpoint;

mod cli;
mod client;
mod command;
mod config;
mod errors;
mod output;
mod transport;

use cli::Cli;
pub use client::{ClientError, ControlClient};
use command::ControlCommand;
use config::{ConfigArgumentSplit, ConfigLoader, OrthoConfigLoader, split_config_arguments};
pub(crate) use errors::AppError;
pub use output::OutputFormat;

/// CLI flags recognised by the configuration loader.
///
/// MAINTENANCE: keep in sync with the fields of `fb303_config::Config` the
/// control utility honours.
const CONFIG_CLI_FLAGS: &[&str] = &["--config-path", "--request-timeout-ms"];

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    match execute(args, stdout, stderr, loader) {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::CliUsage(error)) => {
            let _ = write!(stderr, "{error}");
            ExitCode::FAILURE
        }
        Err(error) => {
            let _ = writeln!(stderr, "error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<I, W, E, L>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> Result<(), AppError>
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);
    let cli = match Cli::try_parse_from(prepare_cli_arguments(&args, &split)) {
        Ok(cli) => cli,
        Err(error)
            if matches!(
                error.kind(),
                ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion
            ) =>
        {
            return write!(stdout, "{error}").map_err(AppError::WriteOutput);
        }
        Err(error) => return Err(AppError::CliUsage(error)),
    };

    let commands = cli
        .commands
        .iter()
        .map(|token| token.parse::<ControlCommand>())
        .collect::<Result<Vec<_>, _>>()?;
    let config = loader.load(&split.config_arguments)?;
    let client = ControlClient::new(
        SocketEndpoint::tcp(cli.host.as_str(), cli.port),
        config.request_timeout(),
    );

    let mut failed = 0usize;
    for command in &commands {
        match client.call(command.to_command()) {
            Ok(reply) => {
                let rendered = output::render(command, &reply, cli.output)?;
                writeln!(stdout, "{rendered}").map_err(AppError::WriteOutput)?;
            }
            Err(error) => {
                failed += 1;
                writeln!(stderr, "error: {command}: {error}").map_err(AppError::WriteOutput)?;
            }
        }
    }
    stdout.flush().map_err(AppError::WriteOutput)?;

    if failed == 0 {
        Ok(())
    } else {
        Err(AppError::CommandsFailed {
            failed,
            total: commands.len(),
        })
    }
}

fn prepare_cli_arguments(args: &[OsString], split: &ConfigArgumentSplit) -> Vec<OsString> {
    args.first()
        .into_iter()
        .chain(args.get(split.command_start..).unwrap_or_default())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests;
