//! Runtime string options set by operators.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::errors::{ServiceError, validate_key};

#[derive(Debug, Default)]
pub(crate) struct OptionStore {
    options: Mutex<BTreeMap<String, String>>,
}

impl OptionStore {
    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.options.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set(&self, key: &str, value: &str) -> Result<(), ServiceError> {
        validate_key("option", key)?;
        self.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    pub(crate) fn get(&self, key: &str) -> Result<String, ServiceError> {
        validate_key("option", key)?;
        self.lock()
            .get(key)
            .cloned()
            .ok_or_else(|| ServiceError::OptionNotFound {
                key: key.to_owned(),
            })
    }

    pub(crate) fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock().clone()
    }
}
