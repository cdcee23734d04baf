//! Core types for MockDB.
//!
//! This crate provides the foundational pieces of the mock data layer:
//!
//! - `Value` — dynamically-typed attribute values (with `TypedId` for
//!   polymorphic references)
//! - `Record` — raw attribute storage plus the reserved `id` attribute and
//!   the foreign-key naming convention
//! - `Error` — the NotFound / Integrity / Definition / State taxonomy

pub mod error;
pub mod record;
pub mod value;

pub use error::{
    DefinitionError, Error, IntegrityError, IntegrityErrorKind, NotFoundError, Result, StateError,
};
pub use record::{ID_ATTR, Record, belongs_to_fk, has_many_fk, polymorphic_type_attr};
pub use value::{Id, TypedId, Value};
