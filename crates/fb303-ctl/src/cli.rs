//! Command-line interface definition for `fb303-ctl`.

use clap::Parser;

use crate::output::OutputFormat;

/// Queries and controls an fb303 management server.
#[derive(Parser, Debug)]
#[command(
    name = "fb303-ctl",
    version,
    after_help = "Commands: name, version, status, statusdetails, counters, counter:<name>, \
                  options, option:<name>, setoption:<name>=<value>, alivesince, reinitialize, \
                  shutdown"
)]
pub(crate) struct Cli {
    /// Controls how replies are rendered.
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub(crate) output: OutputFormat,
    /// Host name or address of the management server.
    #[arg(value_name = "HOST")]
    pub(crate) host: String,
    /// TCP port of the management server.
    #[arg(value_name = "PORT")]
    pub(crate) port: u16,
    /// Commands to run, in order.
    #[arg(value_name = "COMMAND", required = true, num_args = 1..)]
    pub(crate) commands: Vec<String>,
}
