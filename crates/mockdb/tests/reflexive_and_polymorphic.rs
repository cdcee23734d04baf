//! Reflexive associations (a type related to itself, one-way and
//! bidirectional) and polymorphic targets resolved per record through the
//! companion type tag.

use mockdb::prelude::*;

/// One-way reflexive: a user has a parent who is also a user, and the parent
/// record carries no trace of its children.
fn family_schema() -> Schema {
    let schema = Schema::new();
    schema
        .define_model("user", vec![Association::belongs_to("parent", "user")])
        .unwrap();
    schema
}

#[test]
fn one_way_reflexive_parent_of_a_saved_child() {
    let schema = family_schema();
    let child = schema.create("user", Record::new().set("name", "Ganon")).unwrap();

    let parent = child
        .create_related("parent", Record::new().set("name", "Ganondorf"))
        .unwrap();

    assert_eq!(child.related_id("parent").unwrap(), parent.id());
    assert!(child.belongs_to("parent").unwrap().unwrap().ptr_eq(&parent));
    // One-way: the parent record gains no id list.
    assert_eq!(
        schema.find_record("user", parent.id().unwrap()).unwrap().get("parentId"),
        None
    );
    assert_eq!(schema.count("user").unwrap(), 2);
}

#[test]
fn one_way_reflexive_parent_of_an_unsaved_child() {
    let schema = family_schema();
    let child = schema
        .new_model("user", Record::new().set("name", "Ganon"))
        .unwrap();

    let parent = child
        .create_related("parent", Record::new().set("name", "Ganondorf"))
        .unwrap();

    // The parent persists immediately; the child stages the foreign key.
    assert!(parent.is_saved());
    assert!(child.is_new());
    assert_eq!(child.related_id("parent").unwrap(), parent.id());
    assert_eq!(schema.count("user").unwrap(), 1);

    child.save().unwrap();
    assert_eq!(schema.count("user").unwrap(), 2);
    assert!(child.belongs_to("parent").unwrap().unwrap().ptr_eq(&parent));
}

#[test]
fn reassigning_a_one_way_parent_leaves_the_old_parent_untouched() {
    let schema = family_schema();
    let child = schema.create("user", Record::new()).unwrap();
    let first = child.create_related("parent", Record::new()).unwrap();
    let second = schema.create("user", Record::new()).unwrap();

    child.set_belongs_to("parent", Some(&second)).unwrap();

    assert_eq!(child.related_id("parent").unwrap(), second.id());
    assert!(first.is_saved());
}

#[test]
fn a_model_may_be_its_own_parent() {
    let schema = family_schema();
    let ouroboros = schema.create("user", Record::new()).unwrap();

    ouroboros.set_belongs_to("parent", Some(&ouroboros)).unwrap();

    let resolved = ouroboros.belongs_to("parent").unwrap().unwrap();
    assert!(resolved.ptr_eq(&ouroboros));
}

#[test]
fn bidirectional_reflexive_parent_and_children() {
    let schema = Schema::new();
    schema
        .define_model(
            "user",
            vec![
                Association::belongs_to("parent", "user").inverse("children"),
                Association::has_many("children", "user").inverse("parent"),
            ],
        )
        .unwrap();

    let parent = schema.create("user", Record::new().set("name", "Rhoam")).unwrap();
    let child = schema.create("user", Record::new().set("name", "Zelda")).unwrap();

    child.set_belongs_to("parent", Some(&parent)).unwrap();

    assert_eq!(parent.related_ids("children").unwrap(), vec![child.id().unwrap()]);
    assert!(child.belongs_to("parent").unwrap().unwrap().ptr_eq(&parent));

    // Detaching through the has-many side clears the child's foreign key.
    parent.set_has_many("children", &[]).unwrap();
    assert_eq!(child.related_id("parent").unwrap(), None);
}

fn commentable_schema() -> Schema {
    let schema = Schema::new();
    schema.define_model("post", vec![]).unwrap();
    schema.define_model("picture", vec![]).unwrap();
    schema
        .define_model(
            "comment",
            vec![Association::belongs_to("commentable", "post").polymorphic()],
        )
        .unwrap();
    schema
}

#[test]
fn polymorphic_belongs_to_stores_id_and_type_tag() {
    let schema = commentable_schema();
    let post = schema.create("post", Record::new().set("title", "hi")).unwrap();
    let comment = schema.create("comment", Record::new()).unwrap();

    comment.set_belongs_to("commentable", Some(&post)).unwrap();

    let stored = schema.find_record("comment", comment.id().unwrap()).unwrap();
    assert_eq!(stored.get("commentableId"), Some(&Value::Int(post.id().unwrap())));
    assert_eq!(stored.get("commentableType"), Some(&Value::Text("post".into())));

    let resolved = comment.belongs_to("commentable").unwrap().unwrap();
    assert!(resolved.ptr_eq(&post));
}

#[test]
fn polymorphic_belongs_to_retargets_across_types() {
    let schema = commentable_schema();
    let post = schema.create("post", Record::new()).unwrap();
    let picture = schema.create("picture", Record::new()).unwrap();
    let comment = schema.create("comment", Record::new()).unwrap();

    comment.set_belongs_to("commentable", Some(&post)).unwrap();
    comment.set_belongs_to("commentable", Some(&picture)).unwrap();

    let resolved = comment.belongs_to("commentable").unwrap().unwrap();
    assert_eq!(resolved.type_name(), "picture");
    assert!(resolved.ptr_eq(&picture));

    comment.set_belongs_to("commentable", None).unwrap();
    let stored = schema.find_record("comment", comment.id().unwrap()).unwrap();
    assert_eq!(stored.get("commentableId"), Some(&Value::Null));
    assert_eq!(stored.get("commentableType"), Some(&Value::Null));
}

#[test]
fn cascading_create_on_a_polymorphic_relation_names_the_type() {
    let schema = commentable_schema();
    let comment = schema.create("comment", Record::new()).unwrap();

    // Without a concrete type the target is ambiguous.
    assert!(comment
        .create_related("commentable", Record::new())
        .unwrap_err()
        .is_fatal());

    let picture = comment
        .create_related_as("commentable", "picture", Record::new().set("url", "x.png"))
        .unwrap();

    assert!(picture.is_saved());
    let resolved = comment.belongs_to("commentable").unwrap().unwrap();
    assert!(resolved.ptr_eq(&picture));
}

#[test]
fn a_destroyed_polymorphic_target_dangles() {
    let schema = commentable_schema();
    let post = schema.create("post", Record::new()).unwrap();
    let comment = schema.create("comment", Record::new()).unwrap();
    comment.set_belongs_to("commentable", Some(&post)).unwrap();

    post.destroy().unwrap();

    assert!(comment.belongs_to("commentable").unwrap_err().is_integrity());
}

#[test]
fn polymorphic_has_many_keeps_tagged_members_in_order() {
    let schema = Schema::new();
    schema.define_model("post", vec![]).unwrap();
    schema.define_model("picture", vec![]).unwrap();
    schema
        .define_model(
            "collection",
            vec![Association::has_many("things", "post").polymorphic()],
        )
        .unwrap();

    let post = schema.create("post", Record::new()).unwrap();
    let picture = schema.create("picture", Record::new()).unwrap();
    let owner = schema.create("collection", Record::new()).unwrap();

    owner
        .set_has_many("things", &[picture.clone(), post.clone()])
        .unwrap();

    let members = owner.has_many("things").unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0].type_name(), "picture");
    assert_eq!(members[1].type_name(), "post");
    assert!(members[0].ptr_eq(&picture));

    // Mixed types may share plain ids; the tagged entries keep them apart.
    assert_eq!(owner.related_ids("things").unwrap(), vec![1, 1]);
}
