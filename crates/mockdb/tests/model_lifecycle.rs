//! Full lifecycle coverage through the public facade: new / saved /
//! destroyed transitions, dirty tracking, identity stability, and session
//! reset.

use mockdb::prelude::*;

fn schema_with_users() -> Schema {
    let schema = Schema::new();
    schema.define_model("user", vec![]).unwrap();
    schema
}

#[test]
fn round_trip_create_find_update_destroy() {
    let schema = schema_with_users();

    let link = schema
        .create("user", Record::new().set("name", "Link").set("age", 17i64))
        .unwrap();
    let id = link.id().unwrap();
    assert_eq!(id, 1);

    let stored = schema.find_record("user", id).unwrap();
    assert_eq!(stored.get("name"), Some(&Value::Text("Link".into())));

    link.update(Record::new().set("age", 18i64)).unwrap();
    let stored = schema.find_record("user", id).unwrap();
    assert_eq!(stored.get("age"), Some(&Value::Int(18)));
    assert_eq!(stored.get("name"), Some(&Value::Text("Link".into())));

    link.destroy().unwrap();
    assert!(schema.find_record("user", id).unwrap_err().is_not_found());
    assert_eq!(schema.count("user").unwrap(), 0);
}

#[test]
fn ids_are_sequential_per_type() {
    let schema = schema_with_users();
    schema.define_model("post", vec![]).unwrap();

    let a = schema.create("user", Record::new()).unwrap();
    let b = schema.create("user", Record::new()).unwrap();
    let p = schema.create("post", Record::new()).unwrap();

    assert_eq!(a.id(), Some(1));
    assert_eq!(b.id(), Some(2));
    // Each collection numbers independently.
    assert_eq!(p.id(), Some(1));
}

#[test]
fn unsaved_edits_are_invisible_until_save() {
    let schema = schema_with_users();
    let link = schema.create("user", Record::new().set("name", "Link")).unwrap();

    link.set("name", "Dark Link").unwrap();
    assert!(link.is_dirty());

    let stored = schema.find_record("user", link.id().unwrap()).unwrap();
    assert_eq!(stored.get("name"), Some(&Value::Text("Link".into())));

    link.save().unwrap();
    let stored = schema.find_record("user", link.id().unwrap()).unwrap();
    assert_eq!(stored.get("name"), Some(&Value::Text("Dark Link".into())));
}

#[test]
fn identity_is_stable_across_handles_and_lookups() {
    let schema = schema_with_users();
    let link = schema.create("user", Record::new().set("name", "Link")).unwrap();
    let id = link.id().unwrap();

    // Lookups through a cloned schema handle still hit the same session.
    let via_clone = schema.clone().model_for("user", id).unwrap();
    assert!(link.ptr_eq(&via_clone));

    // An edit through one handle is visible through the other.
    via_clone.set("name", "Hero of Time").unwrap();
    assert_eq!(
        link.get("name").unwrap(),
        Some(Value::Text("Hero of Time".into()))
    );
}

#[test]
fn destroyed_models_reject_every_operation() {
    let schema = schema_with_users();
    let link = schema.create("user", Record::new()).unwrap();
    let id = link.id().unwrap();
    link.destroy().unwrap();

    assert!(link.is_destroyed());
    assert_eq!(link.id(), Some(id));

    assert!(link.get("name").unwrap_err().is_fatal());
    assert!(link.set("name", "x").unwrap_err().is_fatal());
    assert!(link.save().unwrap_err().is_fatal());
    assert!(link.update(Record::new()).unwrap_err().is_fatal());
    assert!(link.reload().unwrap_err().is_fatal());
    assert!(link.destroy().unwrap_err().is_fatal());
}

#[test]
fn destroy_frees_the_identity_slot() {
    let schema = schema_with_users();
    let first = schema.create("user", Record::new()).unwrap();
    let id = first.id().unwrap();
    first.destroy().unwrap();

    assert!(schema.model_for("user", id).unwrap_err().is_not_found());

    // A later record may legitimately reuse nothing: ids keep counting up.
    let second = schema.create("user", Record::new()).unwrap();
    assert_eq!(second.id(), Some(2));
    assert!(!first.ptr_eq(&second));
}

#[test]
fn reset_clears_records_but_keeps_definitions_and_id_sequence() {
    let schema = schema_with_users();
    schema.create("user", Record::new().set("name", "Link")).unwrap();
    assert_eq!(schema.count("user").unwrap(), 1);

    schema.reset();

    assert_eq!(schema.count("user").unwrap(), 0);
    assert!(schema.is_defined("user"));

    let next = schema.create("user", Record::new()).unwrap();
    assert_eq!(next.id(), Some(2));
}

#[test]
fn queries_over_the_collection() {
    let schema = schema_with_users();
    for name in ["Link", "Zelda", "Ganon"] {
        schema.create("user", Record::new().set("name", name)).unwrap();
    }

    let found = schema
        .where_eq("user", "name", &Value::Text("Zelda".into()))
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), Some(2));

    let picked = schema.find_many_records("user", &[3, 1]).unwrap();
    assert_eq!(picked.len(), 2);
    assert_eq!(picked[0].get("name"), Some(&Value::Text("Ganon".into())));

    // Absent ids are skipped rather than failing the whole lookup.
    let sparse = schema.find_many_records("user", &[1, 99]).unwrap();
    assert_eq!(sparse.len(), 1);

    let all = schema.all("user").unwrap();
    assert_eq!(all.len(), 3);
}

#[test]
fn records_render_as_json_objects() {
    let schema = schema_with_users();
    let link = schema
        .create("user", Record::new().set("name", "Link").set("age", 17i64))
        .unwrap();

    let stored = schema.find_record("user", link.id().unwrap()).unwrap();
    assert_eq!(
        stored.to_json(),
        serde_json::json!({ "id": 1, "name": "Link", "age": 17 })
    );
}

#[test]
fn unknown_types_fail_fast() {
    let schema = schema_with_users();

    assert!(schema.create("ghost", Record::new()).unwrap_err().is_fatal());
    assert!(schema.model_for("ghost", 1).unwrap_err().is_fatal());
    assert!(schema.all("ghost").unwrap_err().is_fatal());
}
