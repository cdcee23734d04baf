//! Dynamically-typed attribute values.

use serde::{Deserialize, Serialize};

/// Identifier assigned by a collection. Strictly positive once assigned.
pub type Id = i64;

/// A tagged reference to a record whose model type is decided at runtime.
///
/// Polymorphic associations cannot fix the related model type at
/// schema-definition time, so the stored value carries both the type tag and
/// the id together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypedId {
    /// Model type name of the referenced record.
    pub model: String,
    /// Identifier within that model's collection.
    pub id: Id,
}

impl TypedId {
    /// Create a new typed reference.
    #[must_use]
    pub fn new(model: impl Into<String>, id: Id) -> Self {
        Self {
            model: model.into(),
            id,
        }
    }
}

impl std::fmt::Display for TypedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.model, self.id)
    }
}

/// A dynamically-typed attribute value.
///
/// Records store attributes as `Value`s so that test fixtures can mix types
/// freely without per-model codegen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Absent / null value
    Null,

    /// Boolean value
    Bool(bool),

    /// 64-bit signed integer (also used for foreign-key ids)
    Int(i64),

    /// 64-bit floating point
    Float(f64),

    /// Text string
    Text(String),

    /// Tagged reference to a record of a runtime-determined type
    Ref(TypedId),

    /// Ordered sequence of values (foreign-key id lists)
    Array(Vec<Value>),

    /// Opaque JSON payload
    Json(serde_json::Value),
}

impl Value {
    /// Check if this value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Interpret this value as a record id.
    #[must_use]
    pub fn as_id(&self) -> Option<Id> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Interpret this value as a typed reference.
    #[must_use]
    pub fn as_typed_id(&self) -> Option<&TypedId> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// Borrow the text content, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret this value as a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Build an array value from a sequence of ids.
    #[must_use]
    pub fn id_array(ids: &[Id]) -> Self {
        Value::Array(ids.iter().map(|id| Value::Int(*id)).collect())
    }

    /// Build an array value from a sequence of typed references.
    #[must_use]
    pub fn ref_array(refs: &[TypedId]) -> Self {
        Value::Array(refs.iter().map(|r| Value::Ref(r.clone())).collect())
    }

    /// Interpret this value as an ordered id list.
    ///
    /// Returns `None` if the value is not an array or contains a non-id
    /// element.
    #[must_use]
    pub fn as_id_array(&self) -> Option<Vec<Id>> {
        match self {
            Value::Array(items) => items.iter().map(Value::as_id).collect(),
            _ => None,
        }
    }

    /// Interpret this value as an ordered list of typed references.
    #[must_use]
    pub fn as_ref_array(&self) -> Option<Vec<TypedId>> {
        match self {
            Value::Array(items) => items
                .iter()
                .map(|v| v.as_typed_id().cloned())
                .collect(),
            _ => None,
        }
    }

    /// Human-readable name of this value's type, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Ref(_) => "ref",
            Value::Array(_) => "array",
            Value::Json(_) => "json",
        }
    }

    /// Convert into a `serde_json::Value` for wire shaping.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => {
                serde_json::Number::from_f64(*f).map_or(serde_json::Value::Null, serde_json::Value::Number)
            }
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Ref(r) => serde_json::json!({ "type": r.model, "id": r.id }),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Json(j) => j.clone(),
        }
    }

    /// Convert a `serde_json::Value` into an attribute value.
    ///
    /// Objects become opaque `Json` payloads; use [`Value::Ref`] explicitly
    /// for polymorphic references.
    #[must_use]
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            obj @ serde_json::Value::Object(_) => Value::Json(obj),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<TypedId> for Value {
    fn from(r: TypedId) -> Self {
        Value::Ref(r)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}
