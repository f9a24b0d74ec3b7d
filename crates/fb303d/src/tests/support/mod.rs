//! Test harness utilities shared by the behavioural suites.

mod config_loader;
#[cfg(unix)]
mod process_world;
mod reporter;
mod world;

pub use config_loader::{FailingConfigLoader, TestConfigLoader};
#[cfg(unix)]
pub use process_world::{ProcessTestWorld, SIGTERM};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use world::{TestWorld, world};
