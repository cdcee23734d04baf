//! MockDB - an in-memory mock relational data layer for front-end test
//! suites.
//!
//! MockDB gives a test or mock server a tiny relational database: model
//! types registered on a session-scoped [`Schema`], per-type [`Collection`]s
//! with sequential ids, and live [`Model`] wrappers with belongs-to and
//! has-many associations that keep both sides of a declared inverse
//! consistent through a single mutation.
//!
//! # Quick Start
//!
//! ```
//! use mockdb::prelude::*;
//!
//! let schema = Schema::new();
//! schema
//!     .define_model(
//!         "post",
//!         vec![Association::has_many("comments", "comment").inverse("post")],
//!     )
//!     .unwrap();
//! schema
//!     .define_model(
//!         "comment",
//!         vec![Association::belongs_to("post", "post").inverse("comments")],
//!     )
//!     .unwrap();
//!
//! let post = schema
//!     .create("post", Record::new().set("title", "hello"))
//!     .unwrap();
//!
//! // Cascading create: the comment is persisted, its `postId` is set, and
//! // the post's `commentsIds` gains the new id, all in one call.
//! let comment = post
//!     .create_related("comments", Record::new().set("body", "first!"))
//!     .unwrap();
//!
//! assert_eq!(comment.related_id("post").unwrap(), post.id());
//! assert_eq!(post.has_many("comments").unwrap().len(), 1);
//! ```
//!
//! Repeated lookups of the same record return the same instance, so an edit
//! made through one handle is visible through every other:
//!
//! ```
//! # use mockdb::prelude::*;
//! # let schema = Schema::new();
//! # schema.define_model("user", vec![]).unwrap();
//! let a = schema.create("user", Record::new().set("name", "Link")).unwrap();
//! let b = schema.model_for("user", a.id().unwrap()).unwrap();
//! assert!(a.ptr_eq(&b));
//! ```

pub use mockdb_core::{
    DefinitionError, Error, ID_ATTR, Id, IntegrityError, IntegrityErrorKind, NotFoundError,
    Record, Result, StateError, TypedId, Value, belongs_to_fk, has_many_fk,
    polymorphic_type_attr,
};
pub use mockdb_orm::{
    Association, AssociationKind, Collection, IdentityMap, Model, ModelKey, ModelType, Schema,
    Target,
};

/// Commonly used types, importable in one line.
pub mod prelude {
    pub use crate::{
        Association, AssociationKind, Error, Id, Model, Record, Result, Schema, TypedId, Value,
    };
}
