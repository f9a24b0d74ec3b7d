//! Maps decoded commands onto management service operations.

use std::sync::Arc;

use fb303_types::{Command, Reply};
use tracing::debug;

use crate::service::{ManagementService, ServiceError};

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Routes each [`Command`] variant to the service.
#[derive(Debug, Clone)]
pub(crate) struct CommandRouter {
    service: Arc<ManagementService>,
}

impl CommandRouter {
    pub(crate) const fn new(service: Arc<ManagementService>) -> Self {
        Self { service }
    }

    pub(crate) fn route(&self, command: &Command) -> Result<Reply, ServiceError> {
        debug!(
            target: DISPATCH_TARGET,
            command = command.name().as_str(),
            "routing command"
        );
        let service = &self.service;
        let reply = match command {
            Command::GetName => Reply::Text(service.name().to_owned()),
            Command::GetVersion => Reply::Text(service.version().to_owned()),
            Command::GetStatus => Reply::Status(service.status()),
            Command::GetStatusDetails => Reply::Text(service.status_details()),
            Command::GetCounters => Reply::Counters(service.counters()),
            Command::GetCounter { key } => Reply::Integer(service.counter(key)?),
            Command::SetOption { key, value } => {
                service.set_option(key, value)?;
                Reply::Unit
            }
            Command::GetOption { key } => Reply::Text(service.option(key)?),
            Command::GetOptions => Reply::Options(service.options()),
            Command::AliveSince => Reply::Integer(service.alive_since()?),
            Command::Reinitialize => {
                service.reinitialize()?;
                Reply::Unit
            }
            Command::Shutdown => {
                service.shutdown()?;
                Reply::Unit
            }
        };
        Ok(reply)
    }
}
