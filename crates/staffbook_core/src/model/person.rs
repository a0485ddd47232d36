//! Person domain model.
//!
//! # Responsibility
//! - Define the stored person record and its create/patch inputs.
//! - Keep arbitrary extra fields so any caller-supplied shape round-trips.
//!
//! # Invariants
//! - `code` is meant to identify a person but uniqueness is not enforced;
//!   two records may share a code.
//! - `id` is the creation instant in epoch milliseconds and may collide for
//!   records created within the same millisecond.
//! - A stored record without `isActive` counts as inactive.

use crate::model::lenient;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};

/// Creation timestamp in epoch milliseconds.
pub type PersonId = i64;

/// Affiliation of a person, serialized as the `type` field.
///
/// Unrecognized values are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PersonKind {
    Internal,
    External,
    Other(String),
}

impl PersonKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Internal => "internal",
            Self::External => "external",
            Self::Other(value) => value.as_str(),
        }
    }
}

impl From<String> for PersonKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "internal" => Self::Internal,
            "external" => Self::External,
            _ => Self::Other(value),
        }
    }
}

impl From<PersonKind> for String {
    fn from(value: PersonKind) -> Self {
        match value {
            PersonKind::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl Display for PersonKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored person record.
///
/// Scalar fields decode leniently (see `model::lenient`) so one odd record
/// does not make the whole collection unreadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(default, deserialize_with = "lenient::epoch_id")]
    pub id: PersonId,
    #[serde(default, deserialize_with = "lenient::string")]
    pub code: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub first_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub last_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub position: String,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient::opt_kind",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<PersonKind>,
    #[serde(default, deserialize_with = "lenient::strict_true")]
    pub is_active: bool,
    /// ISO-8601 creation instant.
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,
    /// Display-formatted registration date.
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub register_date: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub deactivated_at: Option<String>,
    /// Fields this model does not name, kept as-is. Never holds a name from
    /// `RESERVED_FIELDS`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Person {
    /// Builds an active record from a draft.
    ///
    /// Generated fields (`id`, timestamps, `isActive`) are supplied by the
    /// caller so the store controls the clock. Draft extras named like a
    /// record field are dropped; the generated values win.
    pub fn from_draft(
        draft: PersonDraft,
        id: PersonId,
        created_at: String,
        register_date: String,
    ) -> Self {
        Self {
            id,
            code: draft.code,
            first_name: draft.first_name,
            last_name: draft.last_name,
            position: draft.position,
            kind: draft.kind,
            is_active: true,
            created_at: Some(created_at),
            register_date: Some(register_date),
            updated_at: None,
            deactivated_at: None,
            extra: without_reserved(draft.extra),
        }
    }

    pub fn is_internal(&self) -> bool {
        self.kind == Some(PersonKind::Internal)
    }

    pub fn is_external(&self) -> bool {
        self.kind == Some(PersonKind::External)
    }

    /// Case-insensitive match on names and position, raw substring match on
    /// `code`.
    ///
    /// `lowered_term` must already be lowercase. `code` is compared without
    /// case folding, so an uppercase code only matches through other fields.
    pub fn matches_term(&self, lowered_term: &str) -> bool {
        self.first_name.to_lowercase().contains(lowered_term)
            || self.last_name.to_lowercase().contains(lowered_term)
            || self.code.contains(lowered_term)
            || self.position.to_lowercase().contains(lowered_term)
    }
}

/// Caller input for creating a person. No field is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDraft {
    #[serde(default, deserialize_with = "lenient::string")]
    pub code: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub first_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub last_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub position: String,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient::opt_kind",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<PersonKind>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PersonDraft {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    pub fn name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    pub fn position(mut self, position: impl Into<String>) -> Self {
        self.position = position.into();
        self
    }

    pub fn kind(mut self, kind: PersonKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Attaches a field this model does not name.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Shallow patch applied by `update_person`.
///
/// `None` fields leave the record untouched; `extra` entries overwrite
/// same-named extra fields. `id` and the timestamps belong to the store and
/// cannot be patched; extras carrying those names are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonPatch {
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub code: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub first_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub position: Option<String>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient::opt_kind",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<PersonKind>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_strict_true",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PersonPatch {
    /// Merges present fields onto `person`. Does not touch timestamps.
    pub fn apply_to(self, person: &mut Person) {
        if let Some(code) = self.code {
            person.code = code;
        }
        if let Some(first_name) = self.first_name {
            person.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            person.last_name = last_name;
        }
        if let Some(position) = self.position {
            person.position = position;
        }
        if let Some(kind) = self.kind {
            person.kind = Some(kind);
        }
        if let Some(is_active) = self.is_active {
            person.is_active = is_active;
        }
        person.extra.extend(without_reserved(self.extra));
    }
}

/// Wire names of `Person` fields. `extra` maps must not carry them or the
/// record would serialize the key twice.
pub const RESERVED_FIELDS: &[&str] = &[
    "id",
    "code",
    "firstName",
    "lastName",
    "position",
    "type",
    "isActive",
    "createdAt",
    "registerDate",
    "updatedAt",
    "deactivatedAt",
];

fn without_reserved(mut extra: Map<String, Value>) -> Map<String, Value> {
    extra.retain(|key, _| !RESERVED_FIELDS.contains(&key.as_str()));
    extra
}

#[cfg(test)]
mod tests {
    use super::{PersonDraft, PersonKind, PersonPatch};

    #[test]
    fn kind_keeps_unknown_values_verbatim() {
        let kind: PersonKind = serde_json::from_str("\"contractor\"").unwrap();
        assert_eq!(kind, PersonKind::Other("contractor".to_string()));
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"contractor\"");
    }

    #[test]
    fn patch_from_json_only_sets_present_fields() {
        let patch: PersonPatch =
            serde_json::from_str(r#"{"position":"Lead","team":"core"}"#).unwrap();
        assert_eq!(patch.position.as_deref(), Some("Lead"));
        assert!(patch.first_name.is_none());
        assert_eq!(patch.extra["team"], "core");
    }

    #[test]
    fn reserved_names_never_reach_extra() {
        let mut extra = serde_json::Map::new();
        extra.insert("isActive".to_string(), false.into());
        extra.insert("team".to_string(), "core".into());
        let kept = super::without_reserved(extra);
        assert!(!kept.contains_key("isActive"));
        assert_eq!(kept["team"], "core");
    }

    #[test]
    fn draft_builder_collects_extra_fields() {
        let draft = PersonDraft::new("A1")
            .name("Ali", "Rezai")
            .field("phone", "0912");
        assert_eq!(draft.first_name, "Ali");
        assert_eq!(draft.extra["phone"], "0912");
    }
}
