//! Key-value persistence contract for the record store.
//!
//! # Responsibility
//! - Define the synchronous string get/set capability the store writes to.
//! - Keep storage transport details out of store logic.
//!
//! # Invariants
//! - Values are opaque strings; backends never parse them.
//! - No atomicity across keys: a failure between two `set` calls leaves the
//!   earlier key updated.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;

pub type BackendResult<T> = Result<T, BackendError>;

/// Transport-level failure of a record backend.
#[derive(Debug)]
pub enum BackendError {
    Db(DbError),
    /// Write would push stored bytes past the backend quota.
    QuotaExceeded {
        key: String,
        required_bytes: usize,
        quota_bytes: usize,
    },
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::QuotaExceeded {
                key,
                required_bytes,
                quota_bytes,
            } => write!(
                f,
                "storage quota exceeded writing `{key}`: {required_bytes} bytes > {quota_bytes}"
            ),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::QuotaExceeded { .. } => None,
        }
    }
}

impl From<DbError> for BackendError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for BackendError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Synchronous string key-value storage.
pub trait RecordBackend {
    /// Returns the stored value, or `None` when the key was never written.
    fn get(&self, key: &str) -> BackendResult<Option<String>>;
    /// Stores `value`, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> BackendResult<()>;
}

impl<T: RecordBackend + ?Sized> RecordBackend for &T {
    fn get(&self, key: &str) -> BackendResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        (**self).set(key, value)
    }
}
