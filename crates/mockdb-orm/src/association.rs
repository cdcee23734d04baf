//! Association descriptors.
//!
//! Every declared relationship is represented by one [`Association`] value on
//! the owning model type. The descriptor knows which foreign-key attribute it
//! reads and writes, which model type it targets (or that the target is
//! decided per record for polymorphic relations), and the name of its inverse
//! when one is declared. The resolution and mutation algorithms that consume
//! these descriptors live in the model layer; keeping the descriptor itself
//! pure metadata means the schema can validate a whole relationship graph
//! before any record exists.

use mockdb_core::{
    Error, Record, Result, TypedId, Value, belongs_to_fk, has_many_fk, polymorphic_type_attr,
};
use serde::{Deserialize, Serialize};

/// The kind of a declared association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssociationKind {
    /// The owning record stores a single foreign key (`<name>Id`).
    BelongsTo,
    /// The owning record stores an ordered id list (`<name>Ids`).
    HasMany,
}

/// What an association points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    /// A fixed model type, named at definition time.
    Model(String),
    /// Decided per record via a stored type tag.
    Polymorphic,
}

/// Metadata for one declared relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    /// Relation name (also the prefix of the foreign-key attribute).
    pub name: String,

    /// Kind of association.
    pub kind: AssociationKind,

    /// The related model type, or the polymorphic marker.
    pub target: Target,

    /// Name of the reciprocal relation on the related type, when declared.
    /// One-way relations (including reflexive one-way) have none.
    pub inverse: Option<String>,
}

impl Association {
    /// Declare a belongs-to relation targeting a fixed model type.
    #[must_use]
    pub fn belongs_to(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AssociationKind::BelongsTo,
            target: Target::Model(target.into()),
            inverse: None,
        }
    }

    /// Declare a has-many relation targeting a fixed model type.
    #[must_use]
    pub fn has_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AssociationKind::HasMany,
            target: Target::Model(target.into()),
            inverse: None,
        }
    }

    /// Make the target polymorphic: the related type is read per record from
    /// the companion type tag (belongs-to) or from tagged id entries
    /// (has-many).
    #[must_use]
    pub fn polymorphic(mut self) -> Self {
        self.target = Target::Polymorphic;
        self
    }

    /// Declare the reciprocal relation name on the related type.
    #[must_use]
    pub fn inverse(mut self, name: impl Into<String>) -> Self {
        self.inverse = Some(name.into());
        self
    }

    /// The foreign-key attribute this association reads and writes.
    #[must_use]
    pub fn fk_attr(&self) -> String {
        match self.kind {
            AssociationKind::BelongsTo => belongs_to_fk(&self.name),
            AssociationKind::HasMany => has_many_fk(&self.name),
        }
    }

    /// The companion type-tag attribute (polymorphic belongs-to only).
    #[must_use]
    pub fn type_attr(&self) -> Option<String> {
        match (&self.kind, &self.target) {
            (AssociationKind::BelongsTo, Target::Polymorphic) => {
                Some(polymorphic_type_attr(&self.name))
            }
            _ => None,
        }
    }

    /// The fixed target type name, if not polymorphic.
    #[must_use]
    pub fn target_model(&self) -> Option<&str> {
        match &self.target {
            Target::Model(name) => Some(name),
            Target::Polymorphic => None,
        }
    }

    /// Does this association target its own model type?
    #[must_use]
    pub fn is_reflexive(&self, owner: &str) -> bool {
        self.target_model() == Some(owner)
    }

    /// Is this a one-way association (no declared inverse)?
    #[must_use]
    pub fn is_one_way(&self) -> bool {
        self.inverse.is_none()
    }

    /// Read the belongs-to target out of a record view.
    ///
    /// A null or absent foreign key is a valid empty association. A foreign
    /// key of the wrong shape, or a polymorphic foreign key without its
    /// companion type tag, is an integrity violation. Whether the target id
    /// actually exists is for the resolver to decide.
    pub fn read_belongs_to(&self, owner_model: &str, record: &Record) -> Result<Option<TypedId>> {
        let Some(value) = record.get(&self.fk_attr()) else {
            return Ok(None);
        };
        if value.is_null() {
            return Ok(None);
        }
        let id = value.as_id().ok_or_else(|| {
            Error::malformed_fk(owner_model, &self.name, "foreign key is not an id")
        })?;

        let model = match &self.target {
            Target::Model(name) => name.clone(),
            Target::Polymorphic => {
                let attr = polymorphic_type_attr(&self.name);
                record
                    .get(&attr)
                    .and_then(Value::as_text)
                    .ok_or_else(|| {
                        Error::malformed_fk(
                            owner_model,
                            &self.name,
                            "polymorphic foreign key is missing its type tag",
                        )
                    })?
                    .to_string()
            }
        };
        Ok(Some(TypedId::new(model, id)))
    }

    /// Read the ordered has-many targets out of a record view. An absent or
    /// null id list is a valid empty association.
    pub fn read_has_many(&self, owner_model: &str, record: &Record) -> Result<Vec<TypedId>> {
        let Some(value) = record.get(&self.fk_attr()) else {
            return Ok(Vec::new());
        };
        if value.is_null() {
            return Ok(Vec::new());
        }
        match &self.target {
            Target::Model(name) => value
                .as_id_array()
                .map(|ids| ids.into_iter().map(|id| TypedId::new(name.clone(), id)).collect())
                .ok_or_else(|| {
                    Error::malformed_fk(owner_model, &self.name, "id list is not an array of ids")
                }),
            Target::Polymorphic => value.as_ref_array().ok_or_else(|| {
                Error::malformed_fk(
                    owner_model,
                    &self.name,
                    "id list is not an array of tagged references",
                )
            }),
        }
    }

    /// Attribute patch that points this belongs-to at `target` (or clears
    /// it), including the companion type tag for polymorphic relations.
    #[must_use]
    pub fn belongs_to_patch(&self, target: Option<&TypedId>) -> Record {
        let mut patch = Record::new().set(
            self.fk_attr(),
            target.map_or(Value::Null, |t| Value::Int(t.id)),
        );
        if let Some(type_attr) = self.type_attr() {
            patch.put(
                type_attr,
                target.map_or(Value::Null, |t| Value::Text(t.model.clone())),
            );
        }
        patch
    }

    /// Attribute patch that replaces this has-many's id list with `targets`,
    /// in order.
    #[must_use]
    pub fn has_many_patch(&self, targets: &[TypedId]) -> Record {
        let items: Vec<Value> = targets.iter().map(|t| self.list_entry(t)).collect();
        Record::new().set(self.fk_attr(), Value::Array(items))
    }

    /// The stored list entry representing one member of this has-many: a
    /// tagged reference when polymorphic, a plain id otherwise.
    #[must_use]
    pub fn list_entry(&self, member: &TypedId) -> Value {
        match &self.target {
            Target::Polymorphic => Value::Ref(member.clone()),
            Target::Model(_) => Value::Int(member.id),
        }
    }
}
