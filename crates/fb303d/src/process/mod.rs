//! Foreground process supervision for the `fb303d` binary.

mod errors;
mod launch;
mod shutdown;

pub use errors::LaunchError;
pub use launch::run_daemon;
#[cfg(test)]
pub(crate) use launch::{LaunchPlan, run_daemon_with};
pub use shutdown::ShutdownError;
#[cfg(test)]
pub(crate) use shutdown::ShutdownSignal;

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
