//! Schema: session-scoped registry of model types, collections, and the
//! identity map.
//!
//! A [`Schema`] is created once per test or mock-server session and owns all
//! mutable state for that session. The handle is cheap to clone; every model
//! resolves its associations through the schema it was created by, never
//! through ambient globals. `reset()` between independent test runs restores
//! a blank data set while keeping the registered types.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use mockdb_core::{Error, Id, Record, Result, TypedId, Value};

use crate::association::{Association, AssociationKind, Target};
use crate::collection::Collection;
use crate::identity_map::{IdentityMap, ModelKey};
use crate::model::{Model, ModelState};

/// A registered model type and its association descriptors.
#[derive(Debug, Clone)]
pub struct ModelType {
    name: String,
    associations: BTreeMap<String, Association>,
}

impl ModelType {
    /// The model type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up an association descriptor by relation name.
    #[must_use]
    pub fn association(&self, relation: &str) -> Option<&Association> {
        self.associations.get(relation)
    }

    /// Iterate over all declared associations.
    pub fn associations(&self) -> impl Iterator<Item = &Association> {
        self.associations.values()
    }
}

#[derive(Debug, Default)]
pub(crate) struct SchemaInner {
    types: BTreeMap<String, ModelType>,
    collections: BTreeMap<String, Collection>,
    identity: IdentityMap,
}

/// The session-scoped schema handle.
///
/// Clones share the same underlying registry, collections, and identity map.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    inner: Arc<RwLock<SchemaInner>>,
}

impl Schema {
    /// Create an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn read_inner(&self) -> RwLockReadGuard<'_, SchemaInner> {
        self.inner.read().expect("schema lock poisoned")
    }

    pub(crate) fn write_inner(&self) -> RwLockWriteGuard<'_, SchemaInner> {
        self.inner.write().expect("schema lock poisoned")
    }

    /// Check whether two handles share the same session state.
    #[must_use]
    pub fn ptr_eq(&self, other: &Schema) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Register a model type and its association descriptors.
    ///
    /// Fails fast with a definition error when the type is already
    /// registered, when two associations share a relation name, or when a
    /// declared inverse has no consistent reciprocal descriptor on the
    /// related type. Inverse pairs are validated as soon as both endpoints
    /// are registered, so misconfiguration always surfaces during setup.
    pub fn define_model(
        &self,
        name: impl Into<String>,
        associations: Vec<Association>,
    ) -> Result<()> {
        let name = name.into();
        let mut inner = self.write_inner();

        if inner.types.contains_key(&name) {
            return Err(Error::definition(&name, None, "model type already defined"));
        }

        let mut table = BTreeMap::new();
        for assoc in associations {
            let relation = assoc.name.clone();
            if table.insert(relation.clone(), assoc).is_some() {
                return Err(Error::definition(
                    &name,
                    Some(&relation),
                    "duplicate relation name",
                ));
            }
        }

        tracing::debug!(model = %name, relations = table.len(), "defining model type");
        inner.types.insert(
            name.clone(),
            ModelType {
                name: name.clone(),
                associations: table,
            },
        );

        if let Err(err) = inner.validate_inverses() {
            inner.types.remove(&name);
            return Err(err);
        }
        Ok(())
    }

    /// Check whether a model type is registered.
    #[must_use]
    pub fn is_defined(&self, model: &str) -> bool {
        self.read_inner().types.contains_key(model)
    }

    /// Look up an association descriptor.
    pub fn association(&self, model: &str, relation: &str) -> Result<Association> {
        self.read_inner().association(model, relation).cloned()
    }

    /// All association descriptors declared on a model type.
    pub fn associations(&self, model: &str) -> Result<Vec<Association>> {
        let inner = self.read_inner();
        Ok(inner.type_named(model)?.associations().cloned().collect())
    }

    /// Run a closure against the backing collection for a model type,
    /// creating the collection on first use.
    pub fn with_collection<R>(
        &self,
        model: &str,
        f: impl FnOnce(&Collection) -> R,
    ) -> Result<R> {
        let mut inner = self.write_inner();
        inner.type_named(model)?;
        Ok(f(inner.collection_mut(model)))
    }

    /// Snapshot of every record of a model type, in insertion order.
    pub fn all(&self, model: &str) -> Result<Vec<Record>> {
        self.with_collection(model, |c| c.all().to_vec())
    }

    /// Snapshot of one record by id.
    pub fn find_record(&self, model: &str, id: Id) -> Result<Record> {
        self.with_collection(model, |c| c.find(id).cloned())?
    }

    /// Snapshots of several records, preserving input order.
    pub fn find_many_records(&self, model: &str, ids: &[Id]) -> Result<Vec<Record>> {
        self.with_collection(model, |c| {
            c.find_many(ids).into_iter().cloned().collect()
        })
    }

    /// Snapshots of the records matching a predicate, in insertion order.
    pub fn select_records(
        &self,
        model: &str,
        predicate: impl Fn(&Record) -> bool,
    ) -> Result<Vec<Record>> {
        self.with_collection(model, |c| {
            c.select(predicate).into_iter().cloned().collect()
        })
    }

    /// Snapshots of the records whose attribute equals a value.
    pub fn where_eq(&self, model: &str, attr: &str, value: &Value) -> Result<Vec<Record>> {
        self.with_collection(model, |c| {
            c.where_eq(attr, value).into_iter().cloned().collect()
        })
    }

    /// Number of stored records for a model type.
    pub fn count(&self, model: &str) -> Result<usize> {
        self.with_collection(model, Collection::len)
    }

    /// Resolve a model through the identity map: repeated lookups of the
    /// same (type, id) return the same instance.
    pub fn model_for(&self, model: &str, id: Id) -> Result<Model> {
        let mut inner = self.write_inner();
        let key = ModelKey::new(model, id);

        if let Some(state) = inner.identity.get(&key) {
            return Ok(Model::from_parts(self.clone(), state));
        }

        inner.type_named(model)?;
        inner.record(model, id)?;

        let state = Arc::new(RwLock::new(ModelState::saved(model, id)));
        let state = inner.identity.insert(key, state);
        Ok(Model::from_parts(self.clone(), state))
    }

    /// Produce a new, unsaved model with the given attributes seeded. The
    /// model is not in any collection or the identity map until `save()`.
    pub fn new_model(&self, model: &str, attrs: Record) -> Result<Model> {
        self.read_inner().type_named(model)?;
        let state = Arc::new(RwLock::new(ModelState::unsaved(model, attrs)));
        Ok(Model::from_parts(self.clone(), state))
    }

    /// Create and persist a model in one call.
    pub fn create(&self, model: &str, attrs: Record) -> Result<Model> {
        let instance = self.new_model(model, attrs)?;
        instance.save()?;
        Ok(instance)
    }

    /// Clear every collection and the identity map. Registered model types
    /// survive; id generators are not rewound.
    pub fn reset(&self) {
        let mut inner = self.write_inner();
        tracing::debug!(
            types = inner.types.len(),
            cached_models = inner.identity.len(),
            "resetting schema session state"
        );
        for collection in inner.collections.values_mut() {
            collection.clear();
        }
        inner.identity.clear();
    }
}

impl SchemaInner {
    pub(crate) fn type_named(&self, model: &str) -> Result<&ModelType> {
        self.types
            .get(model)
            .ok_or_else(|| Error::definition(model, None, "unknown model type"))
    }

    pub(crate) fn association(&self, model: &str, relation: &str) -> Result<&Association> {
        self.type_named(model)?.association(relation).ok_or_else(|| {
            Error::definition(model, Some(relation), "no such relation declared")
        })
    }

    pub(crate) fn collection_mut(&mut self, model: &str) -> &mut Collection {
        self.collections
            .entry(model.to_string())
            .or_insert_with(|| Collection::new(model))
    }

    /// Read a record, treating a missing collection the same as a missing id.
    pub(crate) fn record(&self, model: &str, id: Id) -> Result<&Record> {
        match self.collections.get(model) {
            Some(collection) => collection.find(id),
            None => Err(Error::not_found(model, id)),
        }
    }

    pub(crate) fn identity_mut(&mut self) -> &mut IdentityMap {
        &mut self.identity
    }

    /// Append `member` to `holder`'s inverse id list unless already present
    /// (exactly one membership per id).
    pub(crate) fn ensure_membership(
        &mut self,
        holder: &TypedId,
        inverse: &Association,
        member: &TypedId,
    ) -> Result<()> {
        let attr = inverse.fk_attr();
        let entry = inverse.list_entry(member);

        let record = self.record(&holder.model, holder.id)?;
        let mut items = match record.get(&attr) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        if items.contains(&entry) {
            return Ok(());
        }
        items.push(entry);

        let patch = Record::new().set(attr, Value::Array(items));
        self.collection_mut(&holder.model).update(holder.id, &patch)
    }

    /// Remove `member` from `holder`'s inverse id list. A missing holder or
    /// absent membership is a no-op: this runs against the previous end of a
    /// reassigned association, which the caller may already have destroyed.
    pub(crate) fn drop_membership(
        &mut self,
        holder: &TypedId,
        inverse: &Association,
        member: &TypedId,
    ) {
        let attr = inverse.fk_attr();
        let entry = inverse.list_entry(member);

        let Ok(record) = self.record(&holder.model, holder.id) else {
            return;
        };
        let Some(Value::Array(items)) = record.get(&attr) else {
            return;
        };
        if !items.contains(&entry) {
            return;
        }
        let items: Vec<Value> = items.iter().filter(|v| **v != entry).cloned().collect();

        let patch = Record::new().set(attr, Value::Array(items));
        // The holder was just found; the update cannot miss.
        let _ = self.collection_mut(&holder.model).update(holder.id, &patch);
    }

    /// Write the inverse belongs-to foreign key on `member` to point at
    /// `owner` (or clear it). Writes the companion type tag as well when the
    /// inverse is polymorphic.
    pub(crate) fn write_member_fk(
        &mut self,
        member: &TypedId,
        inverse: &Association,
        owner: Option<&TypedId>,
    ) -> Result<()> {
        let mut patch = Record::new().set(
            inverse.fk_attr(),
            owner.map_or(Value::Null, |o| Value::Int(o.id)),
        );
        if let Some(type_attr) = inverse.type_attr() {
            patch.put(
                type_attr,
                owner.map_or(Value::Null, |o| Value::Text(o.model.clone())),
            );
        }
        self.collection_mut(&member.model).update(member.id, &patch)
    }

    /// Shape-check every declared foreign key on a prospective record before
    /// anything is written, so a failing `save()` leaves the collection
    /// untouched. Dangling ids pass: a stored foreign key may legitimately
    /// point at a record destroyed later, and that violation surfaces on
    /// association access, not here.
    pub(crate) fn validate_fks(&self, model: &str, record: &Record) -> Result<()> {
        for assoc in self.type_named(model)?.associations() {
            let targets: Vec<TypedId> = match assoc.kind {
                AssociationKind::BelongsTo => {
                    assoc.read_belongs_to(model, record)?.into_iter().collect()
                }
                AssociationKind::HasMany => assoc.read_has_many(model, record)?,
            };
            if let Some(inverse_name) = assoc.inverse.as_deref() {
                for target in &targets {
                    if self.record(&target.model, target.id).is_ok() {
                        self.association(&target.model, inverse_name)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Bring declared inverses in line with a freshly persisted record:
    /// belongs-to foreign keys gain membership in the holder's inverse id
    /// list, and has-many members get their inverse belongs-to foreign key
    /// written. Runs as part of `save()`, so a model saved with association
    /// attributes already in place ends up consistent on both sides. Ids
    /// whose target is gone are skipped; they surface on association access.
    pub(crate) fn sync_inverses(&mut self, model: &str, id: Id) -> Result<()> {
        let associations: Vec<Association> =
            self.type_named(model)?.associations().cloned().collect();
        let owner = TypedId::new(model, id);

        for assoc in associations {
            let Some(inverse_name) = assoc.inverse.clone() else {
                continue;
            };
            let record = self.record(model, id)?.clone();
            match assoc.kind {
                AssociationKind::BelongsTo => {
                    let Some(holder) = assoc.read_belongs_to(model, &record)? else {
                        continue;
                    };
                    if self.record(&holder.model, holder.id).is_err() {
                        continue;
                    }
                    let inverse = self.association(&holder.model, &inverse_name)?.clone();
                    self.ensure_membership(&holder, &inverse, &owner)?;
                }
                AssociationKind::HasMany => {
                    for member in assoc.read_has_many(model, &record)? {
                        if self.record(&member.model, member.id).is_err() {
                            continue;
                        }
                        let inverse = self.association(&member.model, &inverse_name)?.clone();
                        self.write_member_fk(&member, &inverse, Some(&owner))?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Validate every declared inverse whose endpoints are both registered:
    /// the related type must declare the named reciprocal relation, pointing
    /// back with the complementary kind.
    fn validate_inverses(&self) -> Result<()> {
        for owner_type in self.types.values() {
            for assoc in owner_type.associations() {
                let Some(inverse_name) = assoc.inverse.as_deref() else {
                    continue;
                };
                // Polymorphic targets are resolved per record; their inverse
                // pairing can only be checked at use time.
                let Some(target) = assoc.target_model() else {
                    continue;
                };
                let Some(related) = self.types.get(target) else {
                    continue;
                };

                let Some(reciprocal) = related.association(inverse_name) else {
                    return Err(Error::definition(
                        &owner_type.name,
                        Some(&assoc.name),
                        format!(
                            "inverse relation '{inverse_name}' is not declared on '{target}'"
                        ),
                    ));
                };
                if reciprocal.inverse.as_deref() != Some(assoc.name.as_str()) {
                    return Err(Error::definition(
                        &owner_type.name,
                        Some(&assoc.name),
                        format!(
                            "'{target}.{inverse_name}' does not declare '{}' as its inverse",
                            assoc.name
                        ),
                    ));
                }
                let points_back = match &reciprocal.target {
                    Target::Model(back) => back == &owner_type.name,
                    Target::Polymorphic => true,
                };
                if !points_back {
                    return Err(Error::definition(
                        &owner_type.name,
                        Some(&assoc.name),
                        format!("'{target}.{inverse_name}' does not target '{}'", owner_type.name),
                    ));
                }
                let complementary = match assoc.kind {
                    AssociationKind::BelongsTo => AssociationKind::HasMany,
                    AssociationKind::HasMany => AssociationKind::BelongsTo,
                };
                if reciprocal.kind != complementary {
                    return Err(Error::definition(
                        &owner_type.name,
                        Some(&assoc.name),
                        format!(
                            "inverse '{target}.{inverse_name}' must be the complementary kind"
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}
