//! Per-type record storage.
//!
//! A [`Collection`] is an ordered table of raw [`Record`]s for one model
//! type. It owns id assignment and nothing else; relationships live entirely
//! in the schema and association layers.

use mockdb_core::{Error, Id, Record, Result, Value};

/// Ordered table of records for one model type.
///
/// Ids are unique, strictly increasing, and never reused, even after a
/// record is removed.
#[derive(Debug, Clone)]
pub struct Collection {
    model: String,
    records: Vec<Record>,
    next_id: Id,
}

impl Collection {
    /// Create an empty collection for the named model type.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            records: Vec::new(),
            next_id: 1,
        }
    }

    /// The model type this collection stores.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Insert a record, assigning the next id unless the attributes carry an
    /// explicit one (seeded fixtures). An explicit id that collides with an
    /// existing record is a duplicate-id integrity violation; an explicit id
    /// also advances the generator past it so later implicit ids never
    /// collide.
    pub fn insert(&mut self, attrs: Record) -> Result<Id> {
        let id = match attrs.id() {
            Some(explicit) => {
                // Ids are strictly positive once assigned.
                if explicit < 1 {
                    return Err(Error::invalid_id(&self.model, explicit));
                }
                if self.position(explicit).is_some() {
                    return Err(Error::duplicate_id(&self.model, explicit));
                }
                self.next_id = self.next_id.max(explicit + 1);
                explicit
            }
            None => {
                let id = self.next_id;
                self.next_id += 1;
                id
            }
        };

        let mut record = attrs;
        record.set_id(id);
        tracing::trace!(model = %self.model, id, "inserting record");
        self.records.push(record);
        Ok(id)
    }

    /// Merge the given attributes into the record with this id (partial
    /// update: unspecified attributes are untouched).
    pub fn update(&mut self, id: Id, attrs: &Record) -> Result<()> {
        let model = self.model.clone();
        let Some(pos) = self.position(id) else {
            return Err(Error::not_found(model, id));
        };
        tracing::trace!(model = %model, id, "updating record");
        self.records[pos].merge(attrs);
        // The id attribute is not writable through update.
        self.records[pos].set_id(id);
        Ok(())
    }

    /// Delete the record with this id. The id is never reassigned.
    pub fn remove(&mut self, id: Id) -> Result<()> {
        let Some(pos) = self.position(id) else {
            return Err(Error::not_found(&self.model, id));
        };
        tracing::trace!(model = %self.model, id, "removing record");
        self.records.remove(pos);
        Ok(())
    }

    /// Look up a record by id.
    pub fn find(&self, id: Id) -> Result<&Record> {
        self.position(id)
            .map(|pos| &self.records[pos])
            .ok_or_else(|| Error::not_found(&self.model, id))
    }

    /// Look up several records, preserving the input order. Absent ids are
    /// skipped; use [`Collection::find`] when per-id strictness matters.
    #[must_use]
    pub fn find_many(&self, ids: &[Id]) -> Vec<&Record> {
        ids.iter().filter_map(|id| self.find(*id).ok()).collect()
    }

    /// All records, in insertion order.
    #[must_use]
    pub fn all(&self) -> &[Record] {
        &self.records
    }

    /// The first record in insertion order.
    #[must_use]
    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    /// Records matching a predicate, preserving insertion order.
    pub fn select(&self, predicate: impl Fn(&Record) -> bool) -> Vec<&Record> {
        self.records.iter().filter(|r| predicate(r)).collect()
    }

    /// Records whose named attribute equals the given value, preserving
    /// insertion order.
    #[must_use]
    pub fn where_eq(&self, attr: &str, value: &Value) -> Vec<&Record> {
        self.select(|r| r.get(attr) == Some(value))
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check whether the collection has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record. The id generator is not rewound, so ids stay
    /// unique across resets within one session.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    fn position(&self, id: Id) -> Option<usize> {
        self.records.iter().position(|r| r.id() == Some(id))
    }
}
