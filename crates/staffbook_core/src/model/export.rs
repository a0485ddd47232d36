//! Export envelope, import summary and aggregate stats.

use crate::model::evaluation::Evaluation;
use crate::model::person::Person;
use crate::model::settings::Settings;
use serde::{Deserialize, Serialize};

/// Full-state export document.
///
/// Wire shape:
/// `{ exportInfo: { date, app, version, records: { persons, evaluations } },
///    persons, evaluations, settings }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub export_info: ExportInfo,
    pub persons: Vec<Person>,
    pub evaluations: Vec<Evaluation>,
    pub settings: Settings,
}

/// Export metadata block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportInfo {
    /// ISO timestamp of the export.
    pub date: String,
    pub app: String,
    pub version: String,
    pub records: ExportRecordCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecordCounts {
    pub persons: usize,
    pub evaluations: usize,
}

/// What an import replaced. `None` means the key was absent and the
/// collection was left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub persons: Option<usize>,
    pub evaluations: Option<usize>,
    pub settings_replaced: bool,
}

impl ImportSummary {
    pub fn replaced_anything(&self) -> bool {
        self.persons.is_some() || self.evaluations.is_some() || self.settings_replaced
    }
}

/// Aggregate counts over the current collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_persons: usize,
    pub active_persons: usize,
    pub internal_persons: usize,
    pub external_persons: usize,
    pub total_evaluations: usize,
}

impl StoreStats {
    /// Full scan over persons and evaluations.
    pub fn collect(persons: &[Person], evaluations: &[Evaluation]) -> Self {
        persons.iter().fold(
            Self {
                total_persons: persons.len(),
                total_evaluations: evaluations.len(),
                ..Self::default()
            },
            |mut stats, person| {
                if person.is_active {
                    stats.active_persons += 1;
                }
                if person.is_internal() {
                    stats.internal_persons += 1;
                } else if person.is_external() {
                    stats.external_persons += 1;
                }
                stats
            },
        )
    }
}
