//! In-process backend with optional quota.

use super::{BackendError, BackendResult, RecordBackend};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Map-backed storage. Clones share the same entries, so a second store
/// opened on a clone sees what the first one persisted.
///
/// With a quota, a `set` that would make the total of key and value bytes
/// exceed it fails and leaves the previous value in place.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
    quota_bytes: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// Shares entries with `self` but enforces a new quota.
    pub fn limited_to(&self, quota_bytes: usize) -> Self {
        Self {
            entries: Rc::clone(&self.entries),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Writes a raw value without quota checks.
    pub fn seed(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.borrow_mut().insert(key.into(), value.into());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    pub fn used_bytes(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .map(|(key, value)| key.len() + value.len())
            .sum()
    }
}

impl RecordBackend for MemoryBackend {
    fn get(&self, key: &str) -> BackendResult<Option<String>> {
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        if let Some(quota_bytes) = self.quota_bytes {
            let replaced = self
                .entries
                .borrow()
                .get(key)
                .map_or(0, |old| key.len() + old.len());
            let required_bytes = self.used_bytes() - replaced + key.len() + value.len();
            if required_bytes > quota_bytes {
                return Err(BackendError::QuotaExceeded {
                    key: key.to_string(),
                    required_bytes,
                    quota_bytes,
                });
            }
        }

        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
