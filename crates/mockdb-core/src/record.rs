//! Raw attribute records.
//!
//! A [`Record`] is the unit of storage in a collection: a mapping from
//! attribute name to [`Value`], with the reserved `id` attribute holding the
//! collection-assigned identifier. Records know nothing about relationships;
//! foreign keys are ordinary attributes named by convention.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::{Id, Value};

/// Reserved attribute name for the record identifier.
pub const ID_ATTR: &str = "id";

/// Foreign-key attribute name for a belongs-to relation: `<relationName>Id`.
#[must_use]
pub fn belongs_to_fk(relation: &str) -> String {
    format!("{relation}Id")
}

/// Foreign-key attribute name for a has-many relation: `<relationName>Ids`.
#[must_use]
pub fn has_many_fk(relation: &str) -> String {
    format!("{relation}Ids")
}

/// Companion type-tag attribute for a polymorphic belongs-to:
/// `<relationName>Type`.
#[must_use]
pub fn polymorphic_type_attr(relation: &str) -> String {
    format!("{relation}Type")
}

/// A stored attribute record.
///
/// Attribute order is not significant; iteration is in attribute-name order
/// for deterministic output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    attrs: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, replacing any previous value. Returns `self` so
    /// fixture construction can chain.
    #[must_use]
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Set an attribute in place.
    pub fn put(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attrs.insert(name.into(), value.into());
    }

    /// Look up an attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.attrs.remove(name)
    }

    /// Check whether an attribute is present (even if null).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// The record's id, if assigned.
    #[must_use]
    pub fn id(&self) -> Option<Id> {
        self.attrs.get(ID_ATTR).and_then(Value::as_id)
    }

    /// Assign the record's id.
    pub fn set_id(&mut self, id: Id) {
        self.attrs.insert(ID_ATTR.to_string(), Value::Int(id));
    }

    /// Merge another record's attributes into this one (partial update:
    /// attributes absent from `other` are untouched).
    pub fn merge(&mut self, other: &Record) {
        for (name, value) in &other.attrs {
            self.attrs.insert(name.clone(), value.clone());
        }
    }

    /// Merged copy of this record with `other` layered on top.
    #[must_use]
    pub fn merged(&self, other: &Record) -> Record {
        let mut out = self.clone();
        out.merge(other);
        out
    }

    /// Number of attributes, including `id` when assigned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// Check whether the record has no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Iterate over attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Render as a JSON object for response bodies.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .attrs
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }

    /// Build a record from a JSON object. Non-object inputs yield an empty
    /// record.
    #[must_use]
    pub fn from_json(json: serde_json::Value) -> Self {
        let mut record = Record::new();
        if let serde_json::Value::Object(map) = json {
            for (k, v) in map {
                record.put(k, Value::from_json(v));
            }
        }
        record
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            attrs: iter.into_iter().collect(),
        }
    }
}
