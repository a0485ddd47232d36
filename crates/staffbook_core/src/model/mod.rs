//! Domain model for persisted records.
//!
//! # Responsibility
//! - Define the JSON shapes stored under each backend key.
//! - Keep wire names (camelCase, `type`) stable across load/save.
//!
//! # Invariants
//! - Unknown person fields survive a load/save cycle.
//! - Evaluations are opaque; nothing in core inspects their content.

pub mod evaluation;
pub mod export;
mod lenient;
pub mod person;
pub mod settings;
