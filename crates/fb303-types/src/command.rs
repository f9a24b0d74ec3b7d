//! Management commands and the request envelope that carries them.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// One of the fixed management commands, with its arguments.
///
/// Serialised internally tagged: `{"command":"get_counter","key":"hits"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Returns the service name.
    GetName,
    /// Returns the service version.
    GetVersion,
    /// Returns the current [`crate::ServiceStatus`].
    GetStatus,
    /// Returns the free-form status detail.
    GetStatusDetails,
    /// Returns a snapshot of every counter.
    GetCounters,
    /// Returns a single counter.
    GetCounter {
        /// Counter name.
        key: String,
    },
    /// Sets (or replaces) an option.
    SetOption {
        /// Option name.
        key: String,
        /// Option value.
        value: String,
    },
    /// Returns a single option.
    GetOption {
        /// Option name.
        key: String,
    },
    /// Returns a snapshot of every option.
    GetOptions,
    /// Returns the epoch second at which the service first became alive.
    AliveSince,
    /// Cycles the service through `STARTING` back to `ALIVE`.
    Reinitialize,
    /// Begins an orderly shutdown.
    Shutdown,
}

/// Wire name of a [`Command`], without its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum CommandName {
    /// `get_name`
    GetName,
    /// `get_version`
    GetVersion,
    /// `get_status`
    GetStatus,
    /// `get_status_details`
    GetStatusDetails,
    /// `get_counters`
    GetCounters,
    /// `get_counter`
    GetCounter,
    /// `set_option`
    SetOption,
    /// `get_option`
    GetOption,
    /// `get_options`
    GetOptions,
    /// `alive_since`
    AliveSince,
    /// `reinitialize`
    Reinitialize,
    /// `shutdown`
    Shutdown,
}

/// Raised when a command name is not part of the management protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported command '{0}'")]
pub struct UnknownCommand(pub String);

impl CommandName {
    /// Parses a wire command name.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownCommand`] when `name` is not a management command.
    pub fn parse(name: &str) -> Result<Self, UnknownCommand> {
        Self::from_str(name).map_err(|_| UnknownCommand(name.to_owned()))
    }

    /// The wire name as a static string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

impl Command {
    /// The wire name of this command.
    #[must_use]
    pub const fn name(&self) -> CommandName {
        match self {
            Self::GetName => CommandName::GetName,
            Self::GetVersion => CommandName::GetVersion,
            Self::GetStatus => CommandName::GetStatus,
            Self::GetStatusDetails => CommandName::GetStatusDetails,
            Self::GetCounters => CommandName::GetCounters,
            Self::GetCounter { .. } => CommandName::GetCounter,
            Self::SetOption { .. } => CommandName::SetOption,
            Self::GetOption { .. } => CommandName::GetOption,
            Self::GetOptions => CommandName::GetOptions,
            Self::AliveSince => CommandName::AliveSince,
            Self::Reinitialize => CommandName::Reinitialize,
            Self::Shutdown => CommandName::Shutdown,
        }
    }

    /// Whether the command changes server-side state.
    ///
    /// Callers must not assume such a command had no effect when the
    /// transport fails mid-request.
    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::SetOption { .. } | Self::Reinitialize | Self::Shutdown
        )
    }
}

/// A command paired with the caller-chosen id echoed in its response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Correlation id; the response to this request carries the same value.
    pub id: u64,
    /// The command to execute.
    #[serde(flatten)]
    pub command: Command,
}

impl Request {
    /// Builds a request envelope.
    #[must_use]
    pub const fn new(id: u64, command: Command) -> Self {
        Self { id, command }
    }

    /// Serialises the request as a single newline-terminated JSON line.
    ///
    /// # Errors
    ///
    /// Returns the serialisation error from `serde_json`.
    pub fn to_line(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}
