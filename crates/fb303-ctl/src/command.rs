//! Command tokens accepted on the `fb303-ctl` command line.
//!
//! Tokens are parsed up front so that a typo is reported as a usage error
//! before any connection is made.

use std::fmt;
use std::str::FromStr;

use fb303_types::Command;

use crate::AppError;

/// One command requested by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ControlCommand {
    Name,
    Version,
    Status,
    StatusDetails,
    Counters,
    Counter(String),
    Options,
    Option(String),
    SetOption { key: String, value: String },
    AliveSince,
    Reinitialize,
    Shutdown,
}

impl ControlCommand {
    /// The wire command sent for this token.
    pub(crate) fn to_command(&self) -> Command {
        match self {
            Self::Name => Command::GetName,
            Self::Version => Command::GetVersion,
            Self::Status => Command::GetStatus,
            Self::StatusDetails => Command::GetStatusDetails,
            Self::Counters => Command::GetCounters,
            Self::Counter(key) => Command::GetCounter { key: key.clone() },
            Self::Options => Command::GetOptions,
            Self::Option(key) => Command::GetOption { key: key.clone() },
            Self::SetOption { key, value } => Command::SetOption {
                key: key.clone(),
                value: value.clone(),
            },
            Self::AliveSince => Command::AliveSince,
            Self::Reinitialize => Command::Reinitialize,
            Self::Shutdown => Command::Shutdown,
        }
    }
}

impl FromStr for ControlCommand {
    type Err = AppError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if let Some((prefix, argument)) = token.split_once(':') {
            return parse_keyed(token, prefix, argument);
        }
        match token {
            "name" => Ok(Self::Name),
            "version" => Ok(Self::Version),
            "status" => Ok(Self::Status),
            "statusdetails" => Ok(Self::StatusDetails),
            "counters" => Ok(Self::Counters),
            "options" => Ok(Self::Options),
            "alivesince" => Ok(Self::AliveSince),
            "reinitialize" => Ok(Self::Reinitialize),
            "shutdown" => Ok(Self::Shutdown),
            _ => Err(AppError::UnknownCommand(token.to_owned())),
        }
    }
}

fn parse_keyed(token: &str, prefix: &str, argument: &str) -> Result<ControlCommand, AppError> {
    let invalid = |reason: &str| AppError::InvalidCommand {
        token: token.to_owned(),
        reason: reason.to_owned(),
    };
    match prefix {
        "counter" if argument.is_empty() => Err(invalid("a counter name is required")),
        "counter" => Ok(ControlCommand::Counter(argument.to_owned())),
        "option" if argument.is_empty() => Err(invalid("an option name is required")),
        "option" => Ok(ControlCommand::Option(argument.to_owned())),
        "setoption" => match argument.split_once('=') {
            Some((key, _)) if key.is_empty() => Err(invalid("an option name is required")),
            Some((key, value)) => Ok(ControlCommand::SetOption {
                key: key.to_owned(),
                value: value.to_owned(),
            }),
            None => Err(invalid("expected setoption:<name>=<value>")),
        },
        _ => Err(AppError::UnknownCommand(token.to_owned())),
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => formatter.write_str("name"),
            Self::Version => formatter.write_str("version"),
            Self::Status => formatter.write_str("status"),
            Self::StatusDetails => formatter.write_str("statusdetails"),
            Self::Counters => formatter.write_str("counters"),
            Self::Counter(key) => write!(formatter, "counter:{key}"),
            Self::Options => formatter.write_str("options"),
            Self::Option(key) => write!(formatter, "option:{key}"),
            Self::SetOption { key, value } => write!(formatter, "setoption:{key}={value}"),
            Self::AliveSince => formatter.write_str("alivesince"),
            Self::Reinitialize => formatter.write_str("reinitialize"),
            Self::Shutdown => formatter.write_str("shutdown"),
        }
    }
}
