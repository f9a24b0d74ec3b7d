//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("invalid command '{token}': {reason}")]
    InvalidCommand { token: String, reason: String },
    #[error("failed to serialise reply: {0}")]
    SerialiseReply(serde_json::Error),
    #[error("failed to write output: {0}")]
    WriteOutput(io::Error),
    #[error("{failed} of {total} commands failed")]
    CommandsFailed { failed: usize, total: usize },
}
