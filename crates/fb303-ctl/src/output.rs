//! Rendering of replies for the terminal.

use std::collections::BTreeMap;
use std::fmt::Display;

use clap::ValueEnum;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use fb303_types::Reply;

use crate::AppError;
use crate::command::ControlCommand;

/// Output format selection for replies.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text, one value or `name: value` pair per line.
    #[default]
    Human,
    /// The reply exactly as the server sent it.
    Json,
}

/// Renders `reply` to `command` without a trailing newline.
pub(crate) fn render(
    command: &ControlCommand,
    reply: &Reply,
    format: OutputFormat,
) -> Result<String, AppError> {
    match format {
        OutputFormat::Human => Ok(render_human(command, reply)),
        OutputFormat::Json => serde_json::to_string(reply).map_err(AppError::SerialiseReply),
    }
}

fn render_human(command: &ControlCommand, reply: &Reply) -> String {
    match (command, reply) {
        (ControlCommand::AliveSince, Reply::Integer(timestamp)) => render_timestamp(*timestamp),
        (_, Reply::Text(text)) => text.clone(),
        (_, Reply::Status(status)) => status.to_string(),
        (_, Reply::Integer(value)) => value.to_string(),
        (_, Reply::Counters(counters)) => render_pairs(counters),
        (_, Reply::Options(options)) => render_pairs(options),
        (_, Reply::Unit) => String::from("ok"),
    }
}

fn render_timestamp(timestamp: i64) -> String {
    let datetime = OffsetDateTime::from_unix_timestamp(timestamp)
        .ok()
        .and_then(|value| value.format(&Rfc3339).ok())
        .unwrap_or_else(|| String::from("out of range"));
    format!("timestamp: {timestamp}\ndatetime: {datetime}")
}

fn render_pairs<V: Display>(pairs: &BTreeMap<String, V>) -> String {
    pairs
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}
