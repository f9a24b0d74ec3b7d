//! Service lifecycle status.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Lifecycle status reported by a managed service.
///
/// Discriminants match the fb303 status codes so numeric consumers can map
/// them without a lookup table.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ServiceStatus {
    /// The service has not been started.
    #[default]
    Dead = 0,
    /// The service is initialising.
    Starting = 1,
    /// The service is healthy and serving.
    Alive = 2,
    /// The service is draining before exit.
    Stopping = 3,
    /// The service has stopped; terminal.
    Stopped = 4,
    /// The service is serving but degraded.
    Warning = 5,
}

/// Raised when a numeric status code has no [`ServiceStatus`] counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown service status code {0}")]
pub struct UnknownStatusCode(pub i32);

impl ServiceStatus {
    /// Returns the fb303 numeric code for this status.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Maps an fb303 numeric code back to a status.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownStatusCode`] when `code` is outside `0..=5`.
    pub const fn from_code(code: i32) -> Result<Self, UnknownStatusCode> {
        match code {
            0 => Ok(Self::Dead),
            1 => Ok(Self::Starting),
            2 => Ok(Self::Alive),
            3 => Ok(Self::Stopping),
            4 => Ok(Self::Stopped),
            5 => Ok(Self::Warning),
            other => Err(UnknownStatusCode(other)),
        }
    }

    /// Canonical upper-case name, as used on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Whether moving from `self` to `next` is a legal lifecycle transition.
    ///
    /// `ALIVE`/`WARNING` to `STARTING` is only used by reinitialisation.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Dead, Self::Starting)
                | (Self::Starting, Self::Alive)
                | (Self::Alive, Self::Warning)
                | (Self::Warning, Self::Alive)
                | (Self::Alive | Self::Warning, Self::Starting)
                | (Self::Alive | Self::Warning, Self::Stopping)
                | (Self::Stopping, Self::Stopped)
        )
    }

    /// Whether the service has begun or finished shutting down.
    #[must_use]
    pub const fn is_shutting_down(self) -> bool {
        matches!(self, Self::Stopping | Self::Stopped)
    }
}
