//! Evaluation records.

/// Opaque evaluation blob, stored and exported exactly as received.
pub type Evaluation = serde_json::Value;
