use serde_json::json;
use staffbook_core::{Person, PersonDraft, PersonKind, PersonPatch};

#[test]
fn person_uses_camel_case_wire_fields() {
    let draft = PersonDraft::new("A1")
        .name("Ali", "Rezai")
        .position("Eng")
        .kind(PersonKind::Internal);
    let person = Person::from_draft(
        draft,
        1_700_000_000_123,
        "2023-11-14T22:13:20.123Z".to_string(),
        "2023/11/14".to_string(),
    );

    let json = serde_json::to_value(&person).unwrap();
    assert_eq!(json["id"], 1_700_000_000_123_i64);
    assert_eq!(json["code"], "A1");
    assert_eq!(json["firstName"], "Ali");
    assert_eq!(json["lastName"], "Rezai");
    assert_eq!(json["type"], "internal");
    assert_eq!(json["isActive"], true);
    assert_eq!(json["createdAt"], "2023-11-14T22:13:20.123Z");
    assert_eq!(json["registerDate"], "2023/11/14");
    assert!(json.get("updatedAt").is_none());
    assert!(json.get("deactivatedAt").is_none());
}

#[test]
fn unknown_fields_survive_roundtrip() {
    let stored = json!({
        "id": 42,
        "code": "B7",
        "firstName": "Sara",
        "lastName": "Karimi",
        "position": "Ops",
        "type": "external",
        "isActive": true,
        "phone": "0912",
        "tags": ["night-shift"]
    });

    let person: Person = serde_json::from_value(stored.clone()).unwrap();
    assert_eq!(person.kind, Some(PersonKind::External));
    assert_eq!(person.extra["phone"], "0912");

    let reencoded = serde_json::to_value(&person).unwrap();
    assert_eq!(reencoded, stored);
}

#[test]
fn missing_fields_default_and_missing_is_active_means_inactive() {
    let person: Person = serde_json::from_value(json!({ "id": 1, "code": "X" })).unwrap();
    assert_eq!(person.first_name, "");
    assert_eq!(person.kind, None);
    assert!(!person.is_active);
    assert!(person.extra.is_empty());
}

#[test]
fn patch_apply_only_touches_present_fields() {
    let mut person: Person = serde_json::from_value(json!({
        "id": 1,
        "code": "A1",
        "firstName": "Ali",
        "lastName": "Rezai",
        "position": "Eng",
        "type": "internal",
        "isActive": true,
        "phone": "0912"
    }))
    .unwrap();

    let patch: PersonPatch =
        serde_json::from_value(json!({ "position": "Lead", "phone": "0935" })).unwrap();
    patch.apply_to(&mut person);

    assert_eq!(person.position, "Lead");
    assert_eq!(person.first_name, "Ali");
    assert_eq!(person.kind, Some(PersonKind::Internal));
    assert!(person.is_active);
    assert_eq!(person.extra["phone"], "0935");
}

#[test]
fn matches_term_folds_names_but_not_code() {
    let person: Person = serde_json::from_value(json!({
        "code": "AB-1",
        "firstName": "Ali",
        "lastName": "Rezai",
        "position": "Engineer",
        "isActive": true
    }))
    .unwrap();

    assert!(person.matches_term("ali"));
    assert!(person.matches_term("engi"));
    assert!(person.matches_term("-1"));
    assert!(!person.matches_term("ab-1"));
}

#[test]
fn draft_cannot_override_generated_fields() {
    let draft: PersonDraft = serde_json::from_value(json!({
        "code": "A1",
        "isActive": false,
        "createdAt": "yesterday",
        "id": 7,
        "phone": "0912"
    }))
    .unwrap();
    let person = Person::from_draft(
        draft,
        1_700_000_000_123,
        "2023-11-14T22:13:20.123Z".to_string(),
        "2023/11/14".to_string(),
    );

    assert!(person.is_active);
    assert_eq!(person.id, 1_700_000_000_123);
    assert_eq!(person.extra.len(), 1);
    assert_eq!(person.extra["phone"], "0912");

    let encoded = serde_json::to_string(&person).unwrap();
    assert_eq!(encoded.matches("\"isActive\"").count(), 1);
    let reread: Person = serde_json::from_str(&encoded).unwrap();
    assert_eq!(reread, person);
}

#[test]
fn patch_ignores_store_owned_fields() {
    let mut person: Person = serde_json::from_value(json!({
        "id": 1,
        "code": "A1",
        "isActive": true,
        "createdAt": "2023-11-14T22:13:20.123Z"
    }))
    .unwrap();

    let patch: PersonPatch = serde_json::from_value(json!({
        "createdAt": "x",
        "updatedAt": "y",
        "deactivatedAt": "z",
        "id": 99,
        "team": "core"
    }))
    .unwrap();
    patch.apply_to(&mut person);

    assert_eq!(person.id, 1);
    assert_eq!(person.created_at.as_deref(), Some("2023-11-14T22:13:20.123Z"));
    assert_eq!(person.updated_at, None);
    assert_eq!(person.deactivated_at, None);
    assert_eq!(person.extra.len(), 1);
    assert_eq!(person.extra["team"], "core");

    let encoded = serde_json::to_string(&person).unwrap();
    let reread: Person = serde_json::from_str(&encoded).unwrap();
    assert_eq!(reread, person);
}

#[test]
fn stored_nulls_and_numbers_decode_leniently() {
    let person: Person = serde_json::from_value(json!({
        "id": 1_700_000_000_000.0,
        "code": 42,
        "firstName": null,
        "lastName": "Rezai",
        "position": false,
        "type": null,
        "isActive": "yes",
        "createdAt": null
    }))
    .unwrap();

    assert_eq!(person.id, 1_700_000_000_000);
    assert_eq!(person.code, "42");
    assert_eq!(person.first_name, "");
    assert_eq!(person.position, "false");
    assert_eq!(person.kind, None);
    assert!(!person.is_active);
    assert_eq!(person.created_at, None);
    assert!(person.extra.is_empty());
}

#[test]
fn patch_with_null_fields_leaves_record_alone() {
    let mut person: Person =
        serde_json::from_value(json!({ "id": 1, "code": "A1", "firstName": "Ali", "isActive": true }))
            .unwrap();
    let patch: PersonPatch =
        serde_json::from_value(json!({ "firstName": null, "code": 7, "isActive": null })).unwrap();
    patch.apply_to(&mut person);

    assert_eq!(person.first_name, "Ali");
    assert_eq!(person.code, "7");
    assert!(person.is_active);
}
