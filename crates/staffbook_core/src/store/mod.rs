//! Record store: CRUD, search, export/import over a kv backend.
//!
//! # Responsibility
//! - Own the in-memory person/evaluation/settings state.
//! - Write full state back to the backend after every mutation.
//!
//! # See also
//! - `crate::backend` for the storage contract.

pub mod record_store;
