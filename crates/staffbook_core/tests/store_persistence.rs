use serde_json::{json, Value};
use staffbook_core::{
    FixedClock, LoadOutcome, MemoryBackend, PersonDraft, PersonPatch, RecordBackend, RecordStore,
    Settings, StorageKeys, StoreConfig,
};

const NOW_MS: i64 = 1_700_000_000_123;

fn open_on(backend: &MemoryBackend) -> RecordStore<MemoryBackend> {
    RecordStore::open_with_clock(
        backend.clone(),
        StoreConfig::default(),
        FixedClock::from_epoch_ms(NOW_MS),
    )
}

fn stored_json(backend: &MemoryBackend, key: &str) -> Value {
    serde_json::from_str(&backend.raw(key).unwrap()).unwrap()
}

#[test]
fn empty_backend_loads_defaults_without_reset() {
    let backend = MemoryBackend::new();
    let store = open_on(&backend);

    assert_eq!(
        store.load_outcome(),
        &LoadOutcome::Loaded {
            persons: 0,
            evaluations: 0
        }
    );
    assert!(store.get_all_persons().is_empty());
    assert_eq!(
        store.get_settings(),
        &Settings::defaults_for(&StoreConfig::default())
    );
    assert!(backend.keys().is_empty());
}

#[test]
fn every_mutation_writes_all_keys() {
    let backend = MemoryBackend::new();
    let mut store = open_on(&backend);

    store.add_person(PersonDraft::new("A1").name("Ali", "Rezai"));

    assert_eq!(backend.keys(), ["app_settings", "evaluations", "persons"]);
    let persons = stored_json(&backend, "persons");
    assert_eq!(persons[0]["code"], "A1");
    assert_eq!(persons[0]["isActive"], true);
    assert_eq!(stored_json(&backend, "evaluations"), json!([]));
    assert_eq!(stored_json(&backend, "app_settings")["appName"], "Staffbook");

    store
        .update_person(
            "A1",
            PersonPatch {
                position: Some("Eng".to_string()),
                ..PersonPatch::default()
            },
        )
        .unwrap();
    assert_eq!(stored_json(&backend, "persons")[0]["position"], "Eng");

    store.deactivate_person("A1").unwrap();
    assert_eq!(stored_json(&backend, "persons")[0]["isActive"], false);

    store.delete_person("A1").unwrap();
    assert_eq!(stored_json(&backend, "persons"), json!([]));
}

#[test]
fn reopen_sees_persisted_state() {
    let backend = MemoryBackend::new();
    {
        let mut store = open_on(&backend);
        store.add_person(PersonDraft::new("A1").name("Ali", "Rezai"));
        store.add_evaluation(json!({ "personCode": "A1", "score": 4 }));
    }

    let reopened = open_on(&backend);
    assert_eq!(
        reopened.load_outcome(),
        &LoadOutcome::Loaded {
            persons: 1,
            evaluations: 1
        }
    );
    assert_eq!(reopened.get_person_by_code("A1").unwrap().first_name, "Ali");
    assert_eq!(reopened.get_all_evaluations()[0]["score"], 4);
}

#[test]
fn corrupted_persons_resets_everything_and_persists_defaults() {
    let backend = MemoryBackend::new();
    backend.seed("persons", "{not json");
    backend.seed("evaluations", r#"[{"score": 1}]"#);

    let store = open_on(&backend);

    match store.load_outcome() {
        LoadOutcome::Reset { key, reason } => {
            assert_eq!(key, "persons");
            assert!(!reason.is_empty());
        }
        other => panic!("expected reset, got {other:?}"),
    }
    assert!(store.get_all_persons().is_empty());
    assert!(store.get_all_evaluations().is_empty());
    assert_eq!(stored_json(&backend, "persons"), json!([]));
    assert_eq!(stored_json(&backend, "evaluations"), json!([]));
}

#[test]
fn wrong_shape_settings_triggers_reset() {
    let backend = MemoryBackend::new();
    backend.seed("persons", r#"[{"id": 1, "code": "A1", "isActive": true}]"#);
    backend.seed("app_settings", r#"["not", "an", "object"]"#);

    let store = open_on(&backend);

    assert!(store.load_outcome().is_reset());
    assert!(store.get_all_persons().is_empty());
}

#[test]
fn explicit_reload_reports_reset_after_external_corruption() {
    let backend = MemoryBackend::new();
    let mut store = open_on(&backend);
    store.add_person(PersonDraft::new("A1"));

    backend.seed("evaluations", "null");
    let outcome = store.load_all_data();

    assert!(matches!(outcome, LoadOutcome::Reset { ref key, .. } if key == "evaluations"));
    assert_eq!(store.load_outcome(), &outcome);
    assert!(store.get_all_persons().is_empty());
}

#[test]
fn legacy_records_without_is_active_load_as_inactive() {
    let backend = MemoryBackend::new();
    backend.seed(
        "persons",
        r#"[{"id": 1700000000000, "code": "OLD", "firstName": "Legacy", "createdAt": "۱۴۰۲/۸/۲۳"}]"#,
    );

    let store = open_on(&backend);

    assert!(!store.load_outcome().is_reset());
    let legacy = store.get_person_by_code("OLD").unwrap();
    assert!(!legacy.is_active);
    assert_eq!(legacy.created_at.as_deref(), Some("۱۴۰۲/۸/۲۳"));
    assert!(store.get_active_persons().is_empty());
}

#[test]
fn quota_failure_is_swallowed_and_memory_keeps_mutation() {
    let backend = MemoryBackend::new();
    let mut store = RecordStore::open_with_clock(
        backend.limited_to(64),
        StoreConfig::default(),
        FixedClock::from_epoch_ms(NOW_MS),
    );

    let created = store.add_person(
        PersonDraft::new("A1")
            .name("Ali", "Rezai")
            .position("A position long enough to blow the quota"),
    );

    assert_eq!(store.get_person_by_code("A1"), Some(&created));
    assert!(backend.raw("persons").is_none());
    assert!(store.save_all_data().is_err());
}

#[test]
fn reset_data_restores_defaults_and_persists() {
    let backend = MemoryBackend::new();
    let mut store = open_on(&backend);
    store.add_person(PersonDraft::new("A1"));
    store.export_all_data();
    assert!(store.get_settings().last_backup.is_some());

    store.reset_data();

    assert!(store.get_all_persons().is_empty());
    assert_eq!(store.get_settings().last_backup, None);
    assert_eq!(stored_json(&backend, "persons"), json!([]));
    assert!(stored_json(&backend, "app_settings")["lastBackup"].is_null());
}

#[test]
fn legacy_key_layout_stores_settings_under_settings() {
    let backend = MemoryBackend::new();
    let config = StoreConfig {
        keys: StorageKeys::legacy(),
        ..StoreConfig::default()
    };
    let mut store = RecordStore::open_with_clock(
        backend.clone(),
        config,
        FixedClock::from_epoch_ms(NOW_MS),
    );
    store.add_person(PersonDraft::new("A1"));

    assert!(backend.get("settings").unwrap().is_some());
    assert!(backend.get("app_settings").unwrap().is_none());
}

#[test]
fn stores_work_over_borrowed_backends() {
    let backend = MemoryBackend::new();
    let mut store = RecordStore::open(&backend, StoreConfig::default());
    store.add_person(PersonDraft::new("A1"));
    assert_eq!(stored_json(&backend, "persons")[0]["code"], "A1");
}

#[test]
fn draft_with_generated_field_names_survives_reopen() {
    let backend = MemoryBackend::new();
    let mut store = open_on(&backend);
    store.add_person(PersonDraft::new("B0").name("Sara", "Karimi"));

    let draft: PersonDraft =
        serde_json::from_str(r#"{"code":"A1","isActive":false,"createdAt":"x","phone":"0912"}"#)
            .unwrap();
    let created = store.add_person(draft);
    assert!(created.is_active);

    let reopened = open_on(&backend);
    assert_eq!(
        reopened.load_outcome(),
        &LoadOutcome::Loaded {
            persons: 2,
            evaluations: 0
        }
    );
    assert_eq!(reopened.get_person_by_code("B0").unwrap().first_name, "Sara");
    let a1 = reopened.get_person_by_code("A1").unwrap();
    assert!(a1.is_active);
    assert_eq!(a1.extra["phone"], "0912");
}

#[test]
fn patch_with_timestamp_names_survives_reopen() {
    let backend = MemoryBackend::new();
    let mut store = open_on(&backend);
    store.add_person(PersonDraft::new("B0"));
    store.add_person(PersonDraft::new("A1"));

    let patch: PersonPatch =
        serde_json::from_str(r#"{"createdAt":"x","updatedAt":"y","position":"Lead"}"#).unwrap();
    let updated = store.update_person("A1", patch).unwrap().clone();
    assert_ne!(updated.created_at.as_deref(), Some("x"));
    assert_ne!(updated.updated_at.as_deref(), Some("y"));

    let reopened = open_on(&backend);
    assert!(!reopened.load_outcome().is_reset());
    assert_eq!(reopened.get_all_persons().len(), 2);
    assert_eq!(reopened.get_person_by_code("A1"), Some(&updated));
}

#[test]
fn stored_null_and_numeric_scalars_do_not_reset() {
    let backend = MemoryBackend::new();
    backend.seed(
        "persons",
        r#"[
            {"id": 1, "code": 42, "firstName": null, "lastName": "Rezai", "isActive": true},
            {"id": 2, "code": "B0", "firstName": "Sara", "type": null, "isActive": null}
        ]"#,
    );
    backend.seed("app_settings", r#"{"appName": null, "version": 1, "lastBackup": null}"#);

    let store = open_on(&backend);

    assert_eq!(
        store.load_outcome(),
        &LoadOutcome::Loaded {
            persons: 2,
            evaluations: 0
        }
    );
    let numeric = store.get_person_by_code("42").unwrap();
    assert_eq!(numeric.first_name, "");
    assert!(numeric.is_active);
    let other = store.get_person_by_code("B0").unwrap();
    assert_eq!(other.kind, None);
    assert!(!other.is_active);
    assert_eq!(store.get_settings().version, "1");
}
