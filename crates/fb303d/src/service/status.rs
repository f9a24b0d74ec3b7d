//! Current lifecycle status and its free-form detail.

use std::sync::{Mutex, MutexGuard, PoisonError};

use fb303_types::ServiceStatus;

use super::errors::ServiceError;

#[derive(Debug, Default)]
struct StatusState {
    status: ServiceStatus,
    details: String,
}

/// Status holder enforcing the lifecycle transition table.
#[derive(Debug, Default)]
pub(crate) struct StatusRegistry {
    state: Mutex<StatusState>,
}

impl StatusRegistry {
    fn lock(&self) -> MutexGuard<'_, StatusState> {
        // Every update is a single assignment, so a poisoned guard still holds
        // a consistent value.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn status(&self) -> ServiceStatus {
        self.lock().status
    }

    pub(crate) fn details(&self) -> String {
        self.lock().details.clone()
    }

    /// Moves to `next`, returning the status that was replaced.
    pub(crate) fn transition(&self, next: ServiceStatus) -> Result<ServiceStatus, ServiceError> {
        let mut state = self.lock();
        let previous = state.status;
        if !previous.can_transition_to(next) {
            return Err(ServiceError::InvalidTransition {
                from: previous,
                to: next,
            });
        }
        state.status = next;
        Ok(previous)
    }

    pub(crate) fn set_details(&self, details: String) {
        self.lock().details = details;
    }
}
