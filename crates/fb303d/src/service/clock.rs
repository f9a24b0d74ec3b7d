//! Wall-clock access for start and alive-since timestamps.

use std::sync::{Arc, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> SystemTime;
}

/// [`Clock`] backed by [`SystemTime::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

fn epoch_seconds(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}

/// Records when the service started and when it first became alive.
pub(crate) struct ServiceClock {
    clock: Arc<dyn Clock>,
    started_at: i64,
    alive_since: OnceLock<i64>,
}

impl ServiceClock {
    pub(crate) fn new(clock: Arc<dyn Clock>) -> Self {
        let started_at = epoch_seconds(clock.now());
        Self {
            clock,
            started_at,
            alive_since: OnceLock::new(),
        }
    }

    pub(crate) const fn started_at(&self) -> i64 {
        self.started_at
    }

    /// Stamps the first transition to `ALIVE`; later calls keep the original
    /// value.
    pub(crate) fn mark_alive(&self) -> i64 {
        *self
            .alive_since
            .get_or_init(|| epoch_seconds(self.clock.now()))
    }

    pub(crate) fn alive_since(&self) -> Option<i64> {
        self.alive_since.get().copied()
    }
}
