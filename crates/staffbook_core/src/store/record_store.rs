//! In-memory record store with write-through persistence.
//!
//! # Responsibility
//! - Load persons, evaluations and settings from a `RecordBackend`.
//! - Serve CRUD/search over persons and whole-state export/import.
//! - Persist all three collections after each mutating call.
//!
//! # Invariants
//! - Unreadable stored state is replaced by defaults, never surfaced as an
//!   error; the replacement is reported as `LoadOutcome::Reset`.
//! - Persist failures inside mutations are logged and swallowed; in-memory
//!   state keeps the mutation.
//! - Lookup, update and deactivate act on the first record with a code;
//!   delete removes every record with it.
//! - Accessors hand out shared borrows only.

use crate::backend::{BackendError, RecordBackend};
use crate::clock::{iso_timestamp, Clock, SystemClock};
use crate::config::{StoreConfig, DEFAULT_REGISTER_DATE_FORMAT};
use crate::export::{ExportSink, ExportSinkError};
use crate::model::evaluation::Evaluation;
use crate::model::export::{
    ExportEnvelope, ExportInfo, ExportRecordCounts, ImportSummary, StoreStats,
};
use crate::model::person::{Person, PersonDraft, PersonPatch};
use crate::model::settings::Settings;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter, Write as _};

static FILE_UNSAFE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[:.]").expect("valid file-unsafe regex"));
static SLUG_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

const FALLBACK_EXPORT_SLUG: &str = "staffbook";

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level failure returned to callers.
#[derive(Debug)]
pub enum StoreError {
    /// No person has the requested code.
    NotFound { code: String },
    /// Import payload is not a usable export document.
    InvalidImport(String),
    Serialize(serde_json::Error),
    Backend(BackendError),
    Export(ExportSinkError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { code } => write!(f, "person not found: code `{code}`"),
            Self::InvalidImport(message) => write!(f, "invalid import: {message}"),
            Self::Serialize(err) => write!(f, "{err}"),
            Self::Backend(err) => write!(f, "{err}"),
            Self::Export(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound { .. } | Self::InvalidImport(_) => None,
            Self::Serialize(err) => Some(err),
            Self::Backend(err) => Some(err),
            Self::Export(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

impl From<BackendError> for StoreError {
    fn from(value: BackendError) -> Self {
        Self::Backend(value)
    }
}

impl From<ExportSinkError> for StoreError {
    fn from(value: ExportSinkError) -> Self {
        Self::Export(value)
    }
}

/// Result of reading state from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Stored state was readable; missing keys count as empty.
    Loaded { persons: usize, evaluations: usize },
    /// `key` could not be read or parsed; all state was reset to defaults.
    Reset { key: String, reason: String },
}

impl LoadOutcome {
    pub fn is_reset(&self) -> bool {
        matches!(self, Self::Reset { .. })
    }
}

struct LoadFailure {
    key: String,
    reason: String,
}

/// Person/evaluation store bound to one backend.
///
/// Single-threaded by construction: every call runs to completion and
/// persists before returning.
pub struct RecordStore<B: RecordBackend> {
    backend: B,
    config: StoreConfig,
    clock: Box<dyn Clock>,
    persons: Vec<Person>,
    evaluations: Vec<Evaluation>,
    settings: Settings,
    load_outcome: LoadOutcome,
}

impl<B: RecordBackend> RecordStore<B> {
    /// Opens a store on `backend` using wall-clock time.
    pub fn open(backend: B, config: StoreConfig) -> Self {
        Self::open_with_clock(backend, config, SystemClock)
    }

    /// Opens a store and loads stored state.
    ///
    /// Never fails: unreadable state is reset (see `load_outcome`).
    pub fn open_with_clock(backend: B, config: StoreConfig, clock: impl Clock + 'static) -> Self {
        let settings = Settings::defaults_for(&config);
        let mut store = Self {
            backend,
            config,
            clock: Box::new(clock),
            persons: Vec::new(),
            evaluations: Vec::new(),
            settings,
            load_outcome: LoadOutcome::Loaded {
                persons: 0,
                evaluations: 0,
            },
        };
        store.load_all_data();
        store
    }

    /// How the most recent load went.
    pub fn load_outcome(&self) -> &LoadOutcome {
        &self.load_outcome
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Replaces in-memory state with what the backend holds.
    ///
    /// On any read or parse failure the whole state is reset to defaults and
    /// persisted; the failing key and reason are returned in the outcome.
    pub fn load_all_data(&mut self) -> LoadOutcome {
        let outcome = match self.read_state() {
            Ok((persons, evaluations, settings)) => {
                self.persons = persons;
                self.evaluations = evaluations;
                self.settings = settings;
                info!(
                    "event=store_load module=store status=ok persons={} evaluations={}",
                    self.persons.len(),
                    self.evaluations.len()
                );
                LoadOutcome::Loaded {
                    persons: self.persons.len(),
                    evaluations: self.evaluations.len(),
                }
            }
            Err(failure) => {
                warn!(
                    "event=store_load module=store status=reset key={} reason={}",
                    failure.key, failure.reason
                );
                self.reset_data();
                LoadOutcome::Reset {
                    key: failure.key,
                    reason: failure.reason,
                }
            }
        };
        self.load_outcome = outcome.clone();
        outcome
    }

    /// Writes persons, evaluations and settings, in that order.
    ///
    /// Stops at the first failing key; earlier keys stay written.
    pub fn save_all_data(&self) -> StoreResult<()> {
        let keys = &self.config.keys;
        self.backend
            .set(&keys.persons, &serde_json::to_string(&self.persons)?)?;
        self.backend
            .set(&keys.evaluations, &serde_json::to_string(&self.evaluations)?)?;
        self.backend
            .set(&keys.settings, &serde_json::to_string(&self.settings)?)?;
        debug!(
            "event=store_save module=store status=ok persons={} evaluations={}",
            self.persons.len(),
            self.evaluations.len()
        );
        Ok(())
    }

    /// Drops all records, restores default settings and persists.
    pub fn reset_data(&mut self) {
        self.persons.clear();
        self.evaluations.clear();
        self.settings = Settings::defaults_for(&self.config);
        warn!("event=store_reset module=store status=ok");
        self.persist("reset_data");
    }

    /// Appends a new active person built from `draft`.
    ///
    /// `id` is the current epoch millisecond, so two persons created in the
    /// same millisecond share an id. No field is validated.
    pub fn add_person(&mut self, draft: PersonDraft) -> Person {
        let now = self.clock.now();
        let person = Person::from_draft(
            draft,
            now.timestamp_millis(),
            iso_timestamp(now),
            self.register_date(now),
        );
        self.persons.push(person.clone());
        info!(
            "event=person_add module=store status=ok id={} total={}",
            person.id,
            self.persons.len()
        );
        self.persist("add_person");
        person
    }

    pub fn get_all_persons(&self) -> &[Person] {
        &self.persons
    }

    /// Persons with `isActive == true`, in collection order.
    pub fn get_active_persons(&self) -> Vec<&Person> {
        self.persons.iter().filter(|person| person.is_active).collect()
    }

    /// First person whose code equals `code`.
    pub fn get_person_by_code(&self, code: &str) -> Option<&Person> {
        self.persons.iter().find(|person| person.code == code)
    }

    /// Substring search over names, position and code.
    ///
    /// Names and position are compared case-insensitively. `code` is matched
    /// against the lowercased term without folding the code itself. An empty
    /// term matches every person.
    pub fn search_persons(&self, term: &str) -> Vec<&Person> {
        let lowered = term.to_lowercase();
        self.persons
            .iter()
            .filter(|person| person.matches_term(&lowered))
            .collect()
    }

    /// Shallow-merges `patch` onto the first person with `code` and stamps
    /// `updatedAt`.
    ///
    /// # Errors
    /// - `NotFound` when no person has `code`; nothing is modified or written.
    pub fn update_person(&mut self, code: &str, patch: PersonPatch) -> StoreResult<&Person> {
        let index = self.index_of(code)?;
        let updated_at = iso_timestamp(self.clock.now());
        let person = &mut self.persons[index];
        patch.apply_to(person);
        person.updated_at = Some(updated_at);
        info!("event=person_update module=store status=ok id={}", person.id);
        self.persist("update_person");
        Ok(&self.persons[index])
    }

    /// Removes every person with `code` and returns how many were removed.
    ///
    /// # Errors
    /// - `NotFound` when none matched; nothing is written.
    pub fn delete_person(&mut self, code: &str) -> StoreResult<usize> {
        let before = self.persons.len();
        self.persons.retain(|person| person.code != code);
        let removed = before - self.persons.len();
        if removed == 0 {
            return Err(StoreError::NotFound {
                code: code.to_string(),
            });
        }
        if removed > 1 {
            warn!("event=person_delete module=store status=ok duplicate_code_matches={removed}");
        } else {
            info!("event=person_delete module=store status=ok removed=1");
        }
        self.persist("delete_person");
        Ok(removed)
    }

    /// Marks the first person with `code` inactive and stamps `deactivatedAt`.
    ///
    /// # Errors
    /// - `NotFound` when no person has `code`.
    pub fn deactivate_person(&mut self, code: &str) -> StoreResult<&Person> {
        let index = self.index_of(code)?;
        let deactivated_at = iso_timestamp(self.clock.now());
        let person = &mut self.persons[index];
        person.is_active = false;
        person.deactivated_at = Some(deactivated_at);
        info!("event=person_deactivate module=store status=ok id={}", person.id);
        self.persist("deactivate_person");
        Ok(&self.persons[index])
    }

    /// Appends an opaque evaluation and returns the new evaluation count.
    pub fn add_evaluation(&mut self, evaluation: Evaluation) -> usize {
        self.evaluations.push(evaluation);
        info!(
            "event=evaluation_add module=store status=ok total={}",
            self.evaluations.len()
        );
        self.persist("add_evaluation");
        self.evaluations.len()
    }

    pub fn get_all_evaluations(&self) -> &[Evaluation] {
        &self.evaluations
    }

    pub fn get_settings(&self) -> &Settings {
        &self.settings
    }

    /// Builds the full-state export document.
    ///
    /// Not a pure read: stamps `settings.lastBackup` with the export time and
    /// persists before returning, so the envelope already carries the new
    /// `lastBackup`.
    pub fn export_all_data(&mut self) -> ExportEnvelope {
        let exported_at = iso_timestamp(self.clock.now());
        self.settings.last_backup = Some(exported_at.clone());
        self.persist("export_all_data");

        info!(
            "event=store_export module=store status=ok persons={} evaluations={}",
            self.persons.len(),
            self.evaluations.len()
        );
        ExportEnvelope {
            export_info: ExportInfo {
                date: exported_at,
                app: self.settings.app_name.clone(),
                version: self.settings.version.clone(),
                records: ExportRecordCounts {
                    persons: self.persons.len(),
                    evaluations: self.evaluations.len(),
                },
            },
            persons: self.persons.clone(),
            evaluations: self.evaluations.clone(),
            settings: self.settings.clone(),
        }
    }

    /// Exports pretty-printed JSON into `sink` and returns the file name used.
    ///
    /// `lastBackup` is updated even when the sink then fails.
    pub fn export_to_file(&mut self, sink: &mut dyn ExportSink) -> StoreResult<String> {
        let envelope = self.export_all_data();
        let contents = serde_json::to_string_pretty(&envelope)?;
        let file_name = export_file_name(&envelope.settings.app_name, &envelope.export_info.date);
        if let Err(err) = sink.write_export(&file_name, &contents) {
            error!("event=export_write module=store status=error error={err}");
            return Err(err.into());
        }
        Ok(file_name)
    }

    /// Replaces collections from an export document.
    ///
    /// Each of `persons`, `evaluations`, `settings` present (and non-null) in
    /// the document replaces the current collection wholesale; absent keys
    /// leave theirs untouched. Everything is decoded before anything is
    /// assigned, so a rejected document changes nothing.
    ///
    /// # Errors
    /// - `InvalidImport` when `json` is not an object or a present key does
    ///   not decode.
    pub fn import_from_file(&mut self, json: &str) -> StoreResult<ImportSummary> {
        let document: Value = serde_json::from_str(json)
            .map_err(|err| self.reject_import(format!("not valid JSON: {err}")))?;
        let Value::Object(mut fields) = document else {
            return Err(self.reject_import("expected a JSON object".to_string()));
        };

        let persons = take_field::<Vec<Person>>(&mut fields, "persons")
            .map_err(|message| self.reject_import(message))?;
        let evaluations = take_field::<Vec<Evaluation>>(&mut fields, "evaluations")
            .map_err(|message| self.reject_import(message))?;
        let settings = take_field::<Settings>(&mut fields, "settings")
            .map_err(|message| self.reject_import(message))?;

        let mut summary = ImportSummary::default();
        if let Some(persons) = persons {
            summary.persons = Some(persons.len());
            self.persons = persons;
        }
        if let Some(evaluations) = evaluations {
            summary.evaluations = Some(evaluations.len());
            self.evaluations = evaluations;
        }
        if let Some(settings) = settings {
            summary.settings_replaced = true;
            self.settings = settings;
        }

        let status = if summary.replaced_anything() {
            "ok"
        } else {
            "noop"
        };
        info!(
            "event=store_import module=store status={status} persons={:?} evaluations={:?} settings={}",
            summary.persons, summary.evaluations, summary.settings_replaced
        );
        self.persist("import_from_file");
        Ok(summary)
    }

    /// Counts over the current collections.
    pub fn get_stats(&self) -> StoreStats {
        StoreStats::collect(&self.persons, &self.evaluations)
    }

    /// Logs current stats at info level.
    pub fn show_stats(&self) {
        let stats = self.get_stats();
        info!(
            "event=store_stats module=store status=ok total={} active={} internal={} external={} evaluations={}",
            stats.total_persons,
            stats.active_persons,
            stats.internal_persons,
            stats.external_persons,
            stats.total_evaluations
        );
    }

    fn persist(&self, operation: &'static str) {
        if let Err(err) = self.save_all_data() {
            error!("event=store_save module=store status=error op={operation} error={err}");
        }
    }

    fn index_of(&self, code: &str) -> StoreResult<usize> {
        self.persons
            .iter()
            .position(|person| person.code == code)
            .ok_or_else(|| StoreError::NotFound {
                code: code.to_string(),
            })
    }

    fn register_date(&self, now: DateTime<Utc>) -> String {
        let mut formatted = String::new();
        if write!(formatted, "{}", now.format(&self.config.register_date_format)).is_ok() {
            return formatted;
        }
        warn!("event=register_date module=store status=error reason=invalid_format");
        now.format(DEFAULT_REGISTER_DATE_FORMAT).to_string()
    }

    fn read_state(&self) -> Result<(Vec<Person>, Vec<Evaluation>, Settings), LoadFailure> {
        let keys = &self.config.keys;
        let persons = self.read_key::<Vec<Person>>(&keys.persons)?;
        let evaluations = self.read_key::<Vec<Evaluation>>(&keys.evaluations)?;
        let settings = self.read_key::<Settings>(&keys.settings)?;
        Ok((
            persons.unwrap_or_default(),
            evaluations.unwrap_or_default(),
            settings.unwrap_or_else(|| Settings::defaults_for(&self.config)),
        ))
    }

    fn read_key<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, LoadFailure> {
        let failure = |reason: String| LoadFailure {
            key: key.to_string(),
            reason,
        };
        let Some(raw) = self.backend.get(key).map_err(|err| failure(err.to_string()))? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| failure(err.to_string()))
    }

    fn reject_import(&self, message: String) -> StoreError {
        warn!("event=store_import module=store status=error reason={message}");
        StoreError::InvalidImport(message)
    }
}

/// Removes `key` from `fields` and decodes it; `null` counts as absent.
fn take_field<T: DeserializeOwned>(
    fields: &mut Map<String, Value>,
    key: &str,
) -> Result<Option<T>, String> {
    match fields.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|err| format!("`{key}`: {err}")),
    }
}

/// `<app-slug>-backup-<timestamp>.json` with `:` and `.` replaced by `-`.
fn export_file_name(app_name: &str, exported_at: &str) -> String {
    let lowered = app_name.to_lowercase();
    let slug = SLUG_SEPARATOR_RE.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    let slug = if slug.is_empty() {
        FALLBACK_EXPORT_SLUG
    } else {
        slug
    };
    let stamp = FILE_UNSAFE_RE.replace_all(exported_at, "-");
    format!("{slug}-backup-{stamp}.json")
}
