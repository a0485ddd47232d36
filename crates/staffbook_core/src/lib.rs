//! Core record-keeping logic for Staffbook.
//! This crate owns the person/evaluation store and its persistence contract.

pub mod backend;
pub mod clock;
pub mod config;
pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod store;

pub use backend::memory::MemoryBackend;
pub use backend::sqlite::SqliteBackend;
pub use backend::{BackendError, BackendResult, RecordBackend};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{LogConfig, StorageKeys, StoreConfig};
pub use export::{BufferedExportSink, DirectoryExportSink, ExportSink, ExportSinkError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::evaluation::Evaluation;
pub use model::export::{ExportEnvelope, ExportInfo, ExportRecordCounts, ImportSummary, StoreStats};
pub use model::person::{Person, PersonDraft, PersonId, PersonKind, PersonPatch};
pub use model::settings::Settings;
pub use store::record_store::{LoadOutcome, RecordStore, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
