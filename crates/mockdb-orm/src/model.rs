//! Model: a live, mutable wrapper binding one record to attribute access,
//! association traversal, and lifecycle operations.
//!
//! A model moves through three states: New (no id, present in no
//! collection), Saved (id assigned, record in its collection, cached in the
//! identity map), and Destroyed (terminal; the id is retained for reference
//! but the record is gone). The wrapper holds only the delta between its
//! in-memory view and the stored record — the pending overlay — so a saved
//! model always reflects the latest stored state plus its own unsaved edits,
//! and dirty tracking falls out of the overlay itself.
//!
//! Association reads and writes go through the descriptors registered on the
//! schema, indexed by relation name; there are no per-type accessor methods.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use mockdb_core::{Error, ID_ATTR, Id, Record, Result, TypedId, Value};

use crate::association::{Association, AssociationKind};
use crate::identity_map::ModelKey;
use crate::schema::Schema;

/// The shared, identity-mapped state of one model instance.
#[derive(Debug)]
pub struct ModelState {
    model: String,
    id: Option<Id>,
    /// Unsaved attribute edits, overlaid on the stored record.
    pending: Record,
    destroyed: bool,
}

impl ModelState {
    pub(crate) fn saved(model: impl Into<String>, id: Id) -> Self {
        Self {
            model: model.into(),
            id: Some(id),
            pending: Record::new(),
            destroyed: false,
        }
    }

    pub(crate) fn unsaved(model: impl Into<String>, attrs: Record) -> Self {
        Self {
            model: model.into(),
            id: None,
            pending: attrs,
            destroyed: false,
        }
    }
}

/// A handle to one model instance.
///
/// Clones share the same state: the identity map guarantees at most one
/// state per (type, id), so any two handles resolved for the same saved
/// record are reference-equal (see [`Model::ptr_eq`]).
#[derive(Debug, Clone)]
pub struct Model {
    schema: Schema,
    state: Arc<RwLock<ModelState>>,
}

impl Model {
    pub(crate) fn from_parts(schema: Schema, state: Arc<RwLock<ModelState>>) -> Self {
        Self { schema, state }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, ModelState> {
        self.state.read().expect("model lock poisoned")
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ModelState> {
        self.state.write().expect("model lock poisoned")
    }

    fn ensure_active(st: &ModelState, operation: &'static str) -> Result<()> {
        if st.destroyed {
            return Err(Error::state(
                st.model.clone(),
                operation,
                "the model was destroyed",
            ));
        }
        Ok(())
    }

    /// The model type name.
    #[must_use]
    pub fn type_name(&self) -> String {
        self.read_state().model.clone()
    }

    /// The assigned id, if any. Retained after destroy for reference.
    #[must_use]
    pub fn id(&self) -> Option<Id> {
        self.read_state().id
    }

    /// A model with no id: not yet present in any collection.
    #[must_use]
    pub fn is_new(&self) -> bool {
        let st = self.read_state();
        st.id.is_none() && !st.destroyed
    }

    /// A model whose record is in its collection.
    #[must_use]
    pub fn is_saved(&self) -> bool {
        let st = self.read_state();
        st.id.is_some() && !st.destroyed
    }

    /// Destroyed models are terminal; all further operations fail.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.read_state().destroyed
    }

    /// Are there unsaved attribute edits?
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.read_state().pending.is_empty()
    }

    /// Names of the attributes with unsaved edits.
    #[must_use]
    pub fn changed_attrs(&self) -> Vec<String> {
        self.read_state()
            .pending
            .iter()
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Do two handles refer to the same instance?
    #[must_use]
    pub fn ptr_eq(&self, other: &Model) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Snapshot of the model type, id, and merged attribute view.
    fn view(&self) -> Result<(String, Option<Id>, Record)> {
        let st = self.read_state();
        Self::ensure_active(&st, "read")?;
        let merged = match st.id {
            Some(id) => {
                let inner = self.schema.read_inner();
                inner.record(&st.model, id)?.merged(&st.pending)
            }
            None => st.pending.clone(),
        };
        Ok((st.model.clone(), st.id, merged))
    }

    /// Read an attribute: pending edits shadow the stored record.
    pub fn get(&self, attr: &str) -> Result<Option<Value>> {
        let (_, _, view) = self.view()?;
        Ok(view.get(attr).cloned())
    }

    /// The full merged attribute view, including the id once assigned.
    pub fn attrs(&self) -> Result<Record> {
        let (_, _, view) = self.view()?;
        Ok(view)
    }

    /// Stage an attribute edit. Nothing is written to the collection until
    /// `save()`.
    pub fn set(&self, attr: &str, value: impl Into<Value>) -> Result<()> {
        let mut st = self.write_state();
        Self::ensure_active(&st, "set attribute on")?;
        if attr == ID_ATTR {
            return Err(Error::state(
                st.model.clone(),
                "set attribute on",
                "the id attribute is assigned by the collection",
            ));
        }
        st.pending.put(attr, value);
        Ok(())
    }

    /// Persist the model.
    ///
    /// New models insert their merged attributes, adopt the assigned id, and
    /// register in the identity map. Saved models apply the pending overlay
    /// as a partial update (a no-op when clean). Foreign-key shapes are
    /// validated before anything is written, so a failing save stores
    /// nothing and keeps the overlay staged. Afterwards declared inverses
    /// are brought in line with the freshly stored foreign keys.
    pub fn save(&self) -> Result<()> {
        let mut st = self.write_state();
        Self::ensure_active(&st, "save")?;

        match st.id {
            None => {
                let attrs = std::mem::take(&mut st.pending);
                let mut inner = self.schema.write_inner();
                if let Err(err) = inner.validate_fks(&st.model, &attrs) {
                    drop(inner);
                    st.pending = attrs;
                    return Err(err);
                }
                let id = match inner.collection_mut(&st.model).insert(attrs.clone()) {
                    Ok(id) => id,
                    Err(err) => {
                        drop(inner);
                        st.pending = attrs;
                        return Err(err);
                    }
                };
                st.id = Some(id);
                inner
                    .identity_mut()
                    .insert(ModelKey::new(st.model.clone(), id), Arc::clone(&self.state));
                inner.sync_inverses(&st.model, id)
            }
            Some(id) => {
                if st.pending.is_empty() {
                    return Ok(());
                }
                let patch = std::mem::take(&mut st.pending);
                let mut inner = self.schema.write_inner();
                let merged = match inner.record(&st.model, id) {
                    Ok(record) => record.merged(&patch),
                    Err(err) => {
                        drop(inner);
                        st.pending = patch;
                        return Err(err);
                    }
                };
                if let Err(err) = inner.validate_fks(&st.model, &merged) {
                    drop(inner);
                    st.pending = patch;
                    return Err(err);
                }
                if let Err(err) = inner.collection_mut(&st.model).update(id, &patch) {
                    drop(inner);
                    st.pending = patch;
                    return Err(err);
                }
                inner.sync_inverses(&st.model, id)
            }
        }
    }

    /// Merge the given attributes and persist in one call.
    pub fn update(&self, attrs: Record) -> Result<()> {
        {
            let mut st = self.write_state();
            Self::ensure_active(&st, "update")?;
            let mut attrs = attrs;
            attrs.remove(ID_ATTR);
            st.pending.merge(&attrs);
        }
        self.save()
    }

    /// Discard unsaved edits and re-read from the collection. Saved models
    /// only.
    pub fn reload(&self) -> Result<()> {
        let mut st = self.write_state();
        Self::ensure_active(&st, "reload")?;
        let Some(id) = st.id else {
            return Err(Error::state(
                st.model.clone(),
                "reload",
                "the model has never been saved",
            ));
        };
        self.schema.read_inner().record(&st.model, id)?;
        st.pending = Record::new();
        Ok(())
    }

    /// Remove the record from its collection and evict the identity-map
    /// entry. Terminal: the handle keeps its id for reference but every
    /// further operation fails. Associated records are left untouched; a
    /// foreign key that still points here surfaces as an integrity violation
    /// on its next resolution.
    pub fn destroy(&self) -> Result<()> {
        let mut st = self.write_state();
        Self::ensure_active(&st, "destroy")?;
        let Some(id) = st.id else {
            return Err(Error::state(
                st.model.clone(),
                "destroy",
                "the model has never been saved",
            ));
        };
        let mut inner = self.schema.write_inner();
        inner.collection_mut(&st.model).remove(id)?;
        inner
            .identity_mut()
            .remove(&ModelKey::new(st.model.clone(), id));
        drop(inner);
        st.destroyed = true;
        st.pending = Record::new();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Associations
    // ------------------------------------------------------------------

    fn association_named(&self, relation: &str) -> Result<(String, Association)> {
        let model = {
            let st = self.read_state();
            Self::ensure_active(&st, "resolve association on")?;
            st.model.clone()
        };
        let assoc = self.schema.read_inner().association(&model, relation)?.clone();
        Ok((model, assoc))
    }

    fn association_of_kind(
        &self,
        relation: &str,
        kind: AssociationKind,
    ) -> Result<(String, Association)> {
        let (model, assoc) = self.association_named(relation)?;
        if assoc.kind != kind {
            let expected = match kind {
                AssociationKind::BelongsTo => "not a belongs-to relation",
                AssociationKind::HasMany => "not a has-many relation",
            };
            return Err(Error::definition(model, Some(relation), expected));
        }
        Ok((model, assoc))
    }

    /// Ensure `other` can be the target of an association write: alive, of
    /// the declared type, and persisted. A still-new target is saved first
    /// so the foreign key never references a record without an id.
    fn persisted_target(
        &self,
        owner_model: &str,
        assoc: &Association,
        other: &Model,
    ) -> Result<TypedId> {
        if other.is_destroyed() {
            return Err(Error::state(
                other.type_name(),
                "associate",
                "the model was destroyed",
            ));
        }
        if let Some(expected) = assoc.target_model() {
            if other.type_name() != expected {
                return Err(Error::definition(
                    owner_model,
                    Some(&assoc.name),
                    format!("expected a '{expected}' model, got '{}'", other.type_name()),
                ));
            }
        }
        if other.is_new() {
            other.save()?;
        }
        let id = other.id().ok_or_else(|| {
            Error::state(other.type_name(), "associate", "save did not assign an id")
        })?;
        Ok(TypedId::new(other.type_name(), id))
    }

    /// Resolve a belongs-to relation. An unset foreign key is a valid empty
    /// association; a foreign key pointing at a missing record is an
    /// integrity violation, never a silent `None`.
    pub fn belongs_to(&self, relation: &str) -> Result<Option<Model>> {
        let (model, assoc) = self.association_of_kind(relation, AssociationKind::BelongsTo)?;
        let (_, _, view) = self.view()?;
        match assoc.read_belongs_to(&model, &view)? {
            None => Ok(None),
            Some(target) => match self.schema.model_for(&target.model, target.id) {
                Ok(found) => Ok(Some(found)),
                Err(err) if err.is_not_found() => {
                    Err(Error::dangling_fk(model, relation, target.model, target.id))
                }
                Err(err) => Err(err),
            },
        }
    }

    /// Resolve a has-many relation in stored order. Each dangling id is an
    /// integrity violation.
    pub fn has_many(&self, relation: &str) -> Result<Vec<Model>> {
        let (model, assoc) = self.association_of_kind(relation, AssociationKind::HasMany)?;
        let (_, _, view) = self.view()?;
        let targets = assoc.read_has_many(&model, &view)?;
        let mut found = Vec::with_capacity(targets.len());
        for target in targets {
            match self.schema.model_for(&target.model, target.id) {
                Ok(member) => found.push(member),
                Err(err) if err.is_not_found() => {
                    return Err(Error::dangling_fk(model, relation, target.model, target.id));
                }
                Err(err) => return Err(err),
            }
        }
        Ok(found)
    }

    /// Point a belongs-to relation at `other` (or clear it with `None`).
    ///
    /// Both sides change as one procedure: when an inverse has-many is
    /// declared, the owner's id leaves the previous holder's id list and
    /// joins the new holder's, exactly once. A saved owner's record is
    /// updated immediately; a new owner carries the foreign key in its
    /// pending attributes until its own `save()`.
    pub fn set_belongs_to(&self, relation: &str, other: Option<&Model>) -> Result<()> {
        let (model, assoc) = self.association_of_kind(relation, AssociationKind::BelongsTo)?;

        let target = match other {
            None => None,
            Some(other) => Some(self.persisted_target(&model, &assoc, other)?),
        };

        let mut st = self.write_state();
        Self::ensure_active(&st, "set association on")?;
        match st.id {
            Some(owner_id) => {
                let owner = TypedId::new(st.model.clone(), owner_id);
                let mut inner = self.schema.write_inner();
                let view = inner.record(&st.model, owner_id)?.merged(&st.pending);
                let prev = assoc.read_belongs_to(&st.model, &view)?;

                if target.is_none() && prev.is_none() {
                    tracing::warn!(
                        model = %st.model,
                        relation,
                        "clearing a belongs-to that was already empty"
                    );
                }

                if let Some(inverse_name) = assoc.inverse.as_deref() {
                    if let Some(prev) = &prev {
                        if Some(prev) != target.as_ref() {
                            // The previous holder may already be gone; a
                            // dangling previous end has nothing to update.
                            if let Ok(inverse) =
                                inner.association(&prev.model, inverse_name).map(Clone::clone)
                            {
                                inner.drop_membership(prev, &inverse, &owner);
                            }
                        }
                    }
                    if let Some(new_target) = &target {
                        let inverse =
                            inner.association(&new_target.model, inverse_name)?.clone();
                        inner.ensure_membership(new_target, &inverse, &owner)?;
                    }
                }

                let patch = assoc.belongs_to_patch(target.as_ref());
                inner.collection_mut(&st.model).update(owner_id, &patch)?;
                drop(inner);
                // The record now holds the truth; stale pending edits would
                // shadow it.
                st.pending.remove(&assoc.fk_attr());
                if let Some(type_attr) = assoc.type_attr() {
                    st.pending.remove(&type_attr);
                }
                Ok(())
            }
            None => {
                st.pending.merge(&assoc.belongs_to_patch(target.as_ref()));
                Ok(())
            }
        }
    }

    /// Replace a has-many relation's members, in order.
    ///
    /// When an inverse belongs-to is declared, removed members get their
    /// foreign key cleared and added members get it written, as part of the
    /// same procedure.
    pub fn set_has_many(&self, relation: &str, others: &[Model]) -> Result<()> {
        let (model, assoc) = self.association_of_kind(relation, AssociationKind::HasMany)?;

        let mut targets: Vec<TypedId> = Vec::with_capacity(others.len());
        for other in others {
            let target = self.persisted_target(&model, &assoc, other)?;
            // Exactly one membership per id.
            if !targets.contains(&target) {
                targets.push(target);
            }
        }

        let mut st = self.write_state();
        Self::ensure_active(&st, "set association on")?;
        match st.id {
            Some(owner_id) => {
                let owner = TypedId::new(st.model.clone(), owner_id);
                let mut inner = self.schema.write_inner();
                let view = inner.record(&st.model, owner_id)?.merged(&st.pending);
                let old = assoc.read_has_many(&st.model, &view)?;

                if let Some(inverse_name) = assoc.inverse.as_deref() {
                    for removed in old.iter().filter(|t| !targets.contains(t)) {
                        if inner.record(&removed.model, removed.id).is_err() {
                            continue;
                        }
                        let inverse =
                            inner.association(&removed.model, inverse_name)?.clone();
                        inner.write_member_fk(removed, &inverse, None)?;
                    }
                    for added in targets.iter().filter(|t| !old.contains(t)) {
                        let inverse = inner.association(&added.model, inverse_name)?.clone();
                        inner.write_member_fk(added, &inverse, Some(&owner))?;
                    }
                }

                let patch = assoc.has_many_patch(&targets);
                inner.collection_mut(&st.model).update(owner_id, &patch)?;
                drop(inner);
                st.pending.remove(&assoc.fk_attr());
                Ok(())
            }
            None => {
                st.pending.merge(&assoc.has_many_patch(&targets));
                Ok(())
            }
        }
    }

    /// Cascading create: build a related model, persist it, then link it
    /// through this relation.
    ///
    /// The related record is persisted before any foreign key referencing it
    /// is written, so a saved state is never observably invalid. For a
    /// belongs-to relation the owner's foreign key is set; for a has-many
    /// the new id is appended to the owner's id list and the inverse
    /// belongs-to (when declared) is written on the new record.
    pub fn create_related(&self, relation: &str, attrs: Record) -> Result<Model> {
        let (model, assoc) = self.association_named(relation)?;
        let Some(target_model) = assoc.target_model().map(str::to_string) else {
            return Err(Error::definition(
                model,
                Some(relation),
                "polymorphic relation needs an explicit target type; use create_related_as",
            ));
        };
        self.create_related_with(&assoc, &target_model, attrs)
    }

    /// Cascading create for polymorphic relations, naming the concrete
    /// target type.
    pub fn create_related_as(
        &self,
        relation: &str,
        target_model: &str,
        attrs: Record,
    ) -> Result<Model> {
        let (model, assoc) = self.association_named(relation)?;
        if let Some(fixed) = assoc.target_model() {
            if fixed != target_model {
                return Err(Error::definition(
                    model,
                    Some(relation),
                    format!("relation targets '{fixed}', not '{target_model}'"),
                ));
            }
        }
        self.create_related_with(&assoc, target_model, attrs)
    }

    fn create_related_with(
        &self,
        assoc: &Association,
        target_model: &str,
        attrs: Record,
    ) -> Result<Model> {
        let related = self.schema.create(target_model, attrs)?;
        match assoc.kind {
            AssociationKind::BelongsTo => self.set_belongs_to(&assoc.name, Some(&related))?,
            AssociationKind::HasMany => self.push_has_many(assoc, &related)?,
        }
        Ok(related)
    }

    /// Append one persisted member to a has-many, updating the inverse
    /// belongs-to when declared.
    fn push_has_many(&self, assoc: &Association, related: &Model) -> Result<()> {
        let member = TypedId::new(
            related.type_name(),
            related.id().ok_or_else(|| {
                Error::state(related.type_name(), "associate", "save did not assign an id")
            })?,
        );

        let mut st = self.write_state();
        Self::ensure_active(&st, "set association on")?;
        match st.id {
            Some(owner_id) => {
                let owner = TypedId::new(st.model.clone(), owner_id);
                let mut inner = self.schema.write_inner();
                if let Some(inverse_name) = assoc.inverse.as_deref() {
                    let inverse = inner.association(&member.model, inverse_name)?.clone();
                    inner.write_member_fk(&member, &inverse, Some(&owner))?;
                }
                inner.ensure_membership(&owner, assoc, &member)?;
                drop(inner);
                st.pending.remove(&assoc.fk_attr());
                Ok(())
            }
            None => {
                let entry = assoc.list_entry(&member);
                let mut items = match st.pending.get(&assoc.fk_attr()) {
                    Some(Value::Array(items)) => items.clone(),
                    _ => Vec::new(),
                };
                if !items.contains(&entry) {
                    items.push(entry);
                }
                st.pending.put(assoc.fk_attr(), Value::Array(items));
                Ok(())
            }
        }
    }

    /// Raw belongs-to foreign key, without resolving the target.
    pub fn related_id(&self, relation: &str) -> Result<Option<Id>> {
        let (model, assoc) = self.association_of_kind(relation, AssociationKind::BelongsTo)?;
        let (_, _, view) = self.view()?;
        Ok(assoc.read_belongs_to(&model, &view)?.map(|t| t.id))
    }

    /// Raw has-many id list, without resolving the members.
    pub fn related_ids(&self, relation: &str) -> Result<Vec<Id>> {
        let (model, assoc) = self.association_of_kind(relation, AssociationKind::HasMany)?;
        let (_, _, view) = self.view()?;
        Ok(assoc
            .read_has_many(&model, &view)?
            .into_iter()
            .map(|t| t.id)
            .collect())
    }
}

impl PartialEq for Model {
    /// Two handles are equal when they are the same instance, or both refer
    /// to the same saved (type, id).
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let a = self.read_state();
        let b = other.read_state();
        a.model == b.model && a.id.is_some() && a.id == b.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::association::Association;

    fn user_schema() -> Schema {
        let schema = Schema::new();
        schema
            .define_model(
                "user",
                vec![Association::belongs_to("parent", "user")],
            )
            .unwrap();
        schema
    }

    #[test]
    fn new_model_is_not_stored_until_save() {
        let schema = user_schema();
        let link = schema
            .new_model("user", Record::new().set("name", "Link"))
            .unwrap();

        assert!(link.is_new());
        assert_eq!(link.id(), None);
        assert_eq!(schema.count("user").unwrap(), 0);

        link.save().unwrap();

        assert!(link.is_saved());
        let id = link.id().unwrap();
        let stored = schema.find_record("user", id).unwrap();
        assert_eq!(stored.get("name"), Some(&Value::Text("Link".into())));
        assert_eq!(stored.id(), Some(id));
    }

    #[test]
    fn save_registers_in_the_identity_map() {
        let schema = user_schema();
        let link = schema.create("user", Record::new().set("name", "Link")).unwrap();

        let again = schema.model_for("user", link.id().unwrap()).unwrap();
        assert!(link.ptr_eq(&again));
    }

    #[test]
    fn dirty_tracking_follows_the_pending_overlay() {
        let schema = user_schema();
        let link = schema.create("user", Record::new().set("name", "Link")).unwrap();
        assert!(!link.is_dirty());

        link.set("name", "Dark Link").unwrap();
        assert!(link.is_dirty());
        assert_eq!(link.changed_attrs(), vec!["name".to_string()]);

        // The stored record is untouched until save.
        let stored = schema.find_record("user", link.id().unwrap()).unwrap();
        assert_eq!(stored.get("name"), Some(&Value::Text("Link".into())));
        // But the model's own view shows the edit.
        assert_eq!(link.get("name").unwrap(), Some(Value::Text("Dark Link".into())));

        link.save().unwrap();
        assert!(!link.is_dirty());
        let stored = schema.find_record("user", link.id().unwrap()).unwrap();
        assert_eq!(stored.get("name"), Some(&Value::Text("Dark Link".into())));
    }

    #[test]
    fn save_is_idempotent_when_clean() {
        let schema = user_schema();
        let link = schema.create("user", Record::new().set("name", "Link")).unwrap();
        let id = link.id().unwrap();

        link.save().unwrap();
        link.save().unwrap();

        assert_eq!(link.id(), Some(id));
        assert_eq!(schema.count("user").unwrap(), 1);
    }

    #[test]
    fn reload_discards_pending_edits() {
        let schema = user_schema();
        let link = schema.create("user", Record::new().set("name", "Link")).unwrap();

        link.set("name", "Dark Link").unwrap();
        link.reload().unwrap();

        assert!(!link.is_dirty());
        assert_eq!(link.get("name").unwrap(), Some(Value::Text("Link".into())));
    }

    #[test]
    fn reload_on_a_new_model_is_a_state_error() {
        let schema = user_schema();
        let link = schema.new_model("user", Record::new()).unwrap();
        assert!(link.reload().unwrap_err().is_fatal());
    }

    #[test]
    fn saved_view_tracks_the_latest_record() {
        let schema = user_schema();
        let link = schema.create("user", Record::new().set("name", "Link")).unwrap();
        let same = schema.model_for("user", link.id().unwrap()).unwrap();

        same.set("name", "Hero of Time").unwrap();
        same.save().unwrap();

        // Both handles share the instance, so the edit is visible everywhere.
        assert_eq!(
            link.get("name").unwrap(),
            Some(Value::Text("Hero of Time".into()))
        );
    }

    #[test]
    fn destroy_is_terminal() {
        let schema = user_schema();
        let link = schema.create("user", Record::new().set("name", "Link")).unwrap();
        let id = link.id().unwrap();

        link.destroy().unwrap();

        assert!(link.is_destroyed());
        assert_eq!(link.id(), Some(id));
        assert!(schema.find_record("user", id).unwrap_err().is_not_found());
        assert!(schema.model_for("user", id).unwrap_err().is_not_found());

        assert!(link.set("name", "x").unwrap_err().is_fatal());
        assert!(link.save().unwrap_err().is_fatal());
        assert!(link.get("name").unwrap_err().is_fatal());
        assert!(link.destroy().unwrap_err().is_fatal());
    }

    #[test]
    fn destroying_a_new_model_is_a_state_error() {
        let schema = user_schema();
        let link = schema.new_model("user", Record::new()).unwrap();
        assert!(link.destroy().unwrap_err().is_fatal());
    }

    #[test]
    fn the_id_attribute_is_not_writable() {
        let schema = user_schema();
        let link = schema.create("user", Record::new()).unwrap();
        assert!(link.set("id", 99i64).unwrap_err().is_fatal());

        // update() silently strips an id attribute instead of failing.
        link.update(Record::new().set("id", 99i64).set("name", "Link"))
            .unwrap();
        assert_eq!(link.id(), Some(1));
    }

    #[test]
    fn update_merges_and_persists() {
        let schema = user_schema();
        let link = schema.create("user", Record::new().set("name", "Link")).unwrap();

        link.update(Record::new().set("age", 17i64)).unwrap();

        let stored = schema.find_record("user", link.id().unwrap()).unwrap();
        assert_eq!(stored.get("name"), Some(&Value::Text("Link".into())));
        assert_eq!(stored.get("age"), Some(&Value::Int(17)));
        assert!(!link.is_dirty());
    }

    #[test]
    fn model_equality_is_identity_or_saved_id() {
        let schema = user_schema();
        let a = schema.create("user", Record::new()).unwrap();
        let b = schema.model_for("user", a.id().unwrap()).unwrap();
        assert_eq!(a, b);

        let new_a = schema.new_model("user", Record::new()).unwrap();
        let new_b = schema.new_model("user", Record::new()).unwrap();
        assert_ne!(new_a, new_b);
        assert_eq!(new_a, new_a.clone());
    }
}
