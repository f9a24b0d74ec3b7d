//! Test configuration loaders for scenarios covering success and failure
//! paths.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::OrthoError;
use tempfile::TempDir;

use fb303_config::{Config, SocketEndpoint};

use crate::bootstrap::ConfigLoader;

/// Loader that provisions a Unix socket path under a temporary directory.
#[derive(Clone)]
pub struct TestConfigLoader {
    socket_dir: Arc<TempDir>,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temporary directory for socket");
        Self {
            socket_dir: Arc::new(dir),
        }
    }

    /// Endpoint the loaded configuration points at.
    pub fn endpoint(&self) -> SocketEndpoint {
        let path = self.socket_dir.path().join("run").join("fb303d.sock");
        SocketEndpoint::unix(
            path.to_str()
                .expect("temporary socket path was not valid UTF-8"),
        )
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            daemon_socket: self.endpoint(),
            service_name: String::from("scenario-service"),
            service_version: String::from("9.9.9"),
            drain_timeout_ms: 1_000,
            ..Config::default()
        })
    }
}

/// Loader that intentionally fails by passing an invalid socket argument.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_args([
            OsString::from("fb303d"),
            OsString::from("--daemon-socket"),
            OsString::from("invalid://socket"),
        ])
    }
}
