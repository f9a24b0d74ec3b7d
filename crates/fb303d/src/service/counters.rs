//! Named 64-bit counters.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::errors::{ServiceError, validate_key};

/// Thread-safe counter table. Counters spring into existence on first write.
#[derive(Debug, Default)]
pub(crate) struct CounterStore {
    counters: Mutex<BTreeMap<String, i64>>,
}

impl CounterStore {
    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, i64>> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds `delta` and returns the new value. Overflow leaves the counter
    /// unchanged.
    pub(crate) fn increment(&self, key: &str, delta: i64) -> Result<i64, ServiceError> {
        validate_key("counter", key)?;
        let mut counters = self.lock();
        let current = counters.get(key).copied().unwrap_or_default();
        let next = current.checked_add(delta).ok_or_else(|| {
            ServiceError::invalid_argument(format!(
                "incrementing counter '{key}' by {delta} overflows"
            ))
        })?;
        counters.insert(key.to_owned(), next);
        Ok(next)
    }

    pub(crate) fn set(&self, key: &str, value: i64) -> Result<(), ServiceError> {
        validate_key("counter", key)?;
        self.lock().insert(key.to_owned(), value);
        Ok(())
    }

    pub(crate) fn get(&self, key: &str) -> Result<i64, ServiceError> {
        validate_key("counter", key)?;
        self.lock()
            .get(key)
            .copied()
            .ok_or_else(|| ServiceError::CounterNotFound {
                key: key.to_owned(),
            })
    }

    pub(crate) fn snapshot(&self) -> BTreeMap<String, i64> {
        self.lock().clone()
    }
}
