//! Schema, collections, associations, and the model lifecycle for MockDB.
//!
//! The layering mirrors how a session is used:
//!
//! - [`Collection`] — per-type record storage with sequential id assignment
//! - [`Association`] — pure relationship metadata (belongs-to / has-many,
//!   fixed or polymorphic target, optional inverse)
//! - [`Schema`] — the session-scoped registry tying types, collections, and
//!   the identity map together
//! - [`IdentityMap`] — at most one live model instance per (type, id)
//! - [`Model`] — the live wrapper with attribute access, association
//!   traversal, and New / Saved / Destroyed lifecycle

pub mod association;
pub mod collection;
pub mod identity_map;
pub mod model;
pub mod schema;

pub use association::{Association, AssociationKind, Target};
pub use collection::Collection;
pub use identity_map::{IdentityMap, ModelKey};
pub use model::Model;
pub use schema::{ModelType, Schema};
