//! Shared helpers for the control utility test suites.

use std::ffi::OsString;

use fb303_config::Config;

use crate::AppError;
use crate::config::ConfigLoader;

mod fake_server;

pub(crate) use fake_server::{Answer, FakeServer, response_line};

/// Loader that ignores the command line and returns a fixed configuration.
pub(crate) struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    pub(crate) fn with_timeout_ms(request_timeout_ms: u64) -> Self {
        Self {
            config: Config {
                request_timeout_ms,
                ..Config::default()
            },
        }
    }
}

impl Default for StaticConfigLoader {
    fn default() -> Self {
        Self::with_timeout_ms(2_000)
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}
