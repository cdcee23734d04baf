//! Error types for MockDB operations.

use std::fmt;

use crate::value::Id;

/// The primary error type for all MockDB operations.
#[derive(Debug)]
pub enum Error {
    /// Lookup by id failed
    NotFound(NotFoundError),
    /// Data-integrity violation (dangling foreign key, duplicate id)
    Integrity(IntegrityError),
    /// Schema definition error (inverse-relation mismatch, unknown type)
    Definition(DefinitionError),
    /// Invalid model state (operating on a destroyed model)
    State(StateError),
    /// Serialization/deserialization errors
    Serde(String),
    /// Custom error with message
    Custom(String),
}

/// A lookup by id found no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFoundError {
    /// Model type that was searched.
    pub model: String,
    /// The id that was not present.
    pub id: Id,
}

/// A consistency guarantee of the data layer was violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityError {
    pub kind: IntegrityErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityErrorKind {
    /// A foreign key references an id that no longer exists
    DanglingForeignKey,
    /// A foreign-key attribute holds a value of the wrong shape
    MalformedForeignKey,
    /// An explicit insert collided with an existing id
    DuplicateId,
    /// An explicit insert carried a non-positive id
    InvalidId,
}

/// A model type or its associations were declared inconsistently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionError {
    /// Model type being defined.
    pub model: String,
    /// Relation name involved, when applicable.
    pub relation: Option<String>,
    pub message: String,
}

/// An operation was attempted on a model in the wrong lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateError {
    /// Model type of the offending instance.
    pub model: String,
    /// The operation that was attempted.
    pub operation: &'static str,
    pub message: String,
}

impl Error {
    /// A lookup by id failed.
    #[must_use]
    pub fn not_found(model: impl Into<String>, id: Id) -> Self {
        Error::NotFound(NotFoundError {
            model: model.into(),
            id,
        })
    }

    /// A foreign key points at a missing record.
    #[must_use]
    pub fn dangling_fk(
        model: impl Into<String>,
        relation: &str,
        target: impl Into<String>,
        id: Id,
    ) -> Self {
        Error::Integrity(IntegrityError {
            kind: IntegrityErrorKind::DanglingForeignKey,
            message: format!(
                "{}.{relation} references {}({id}), which does not exist",
                model.into(),
                target.into()
            ),
        })
    }

    /// A foreign-key attribute holds a value of the wrong shape.
    #[must_use]
    pub fn malformed_fk(model: impl Into<String>, relation: &str, detail: &str) -> Self {
        Error::Integrity(IntegrityError {
            kind: IntegrityErrorKind::MalformedForeignKey,
            message: format!("{}.{relation}: {detail}", model.into()),
        })
    }

    /// An explicit insert collided with an existing id.
    #[must_use]
    pub fn duplicate_id(model: impl Into<String>, id: Id) -> Self {
        Error::Integrity(IntegrityError {
            kind: IntegrityErrorKind::DuplicateId,
            message: format!("{}({id}) already exists", model.into()),
        })
    }

    /// An explicit insert carried a non-positive id.
    #[must_use]
    pub fn invalid_id(model: impl Into<String>, id: Id) -> Self {
        Error::Integrity(IntegrityError {
            kind: IntegrityErrorKind::InvalidId,
            message: format!("{}: explicit id {id} must be positive", model.into()),
        })
    }

    /// A schema definition was inconsistent.
    #[must_use]
    pub fn definition(
        model: impl Into<String>,
        relation: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Error::Definition(DefinitionError {
            model: model.into(),
            relation: relation.map(str::to_string),
            message: message.into(),
        })
    }

    /// An operation hit a model in the wrong lifecycle state.
    #[must_use]
    pub fn state(model: impl Into<String>, operation: &'static str, message: impl Into<String>) -> Self {
        Error::State(StateError {
            model: model.into(),
            operation,
            message: message.into(),
        })
    }

    /// Is this a not-found error? Mock handlers typically map these to a
    /// 404-style response.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Is this an integrity violation?
    #[must_use]
    pub fn is_integrity(&self) -> bool {
        matches!(self, Error::Integrity(_))
    }

    /// Is this a fatal setup/caller bug (definition or state error)?
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Definition(_) | Error::State(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound(e) => write!(f, "Not found: {}", e),
            Error::Integrity(e) => write!(f, "Integrity violation: {}", e),
            Error::Definition(e) => write!(f, "Schema definition error: {}", e),
            Error::State(e) => write!(f, "Invalid model state: {}", e),
            Error::Serde(msg) => write!(f, "Serialization error: {}", msg),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no {} record with id {}", self.model, self.id)
    }
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.relation {
            Some(relation) => write!(f, "{}.{}: {}", self.model, relation, self.message),
            None => write!(f, "{}: {}", self.model, self.message),
        }
    }
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot {} {}: {}", self.operation, self.model, self.message)
    }
}

impl From<NotFoundError> for Error {
    fn from(err: NotFoundError) -> Self {
        Error::NotFound(err)
    }
}

impl From<IntegrityError> for Error {
    fn from(err: IntegrityError) -> Self {
        Error::Integrity(err)
    }
}

impl From<DefinitionError> for Error {
    fn from(err: DefinitionError) -> Self {
        Error::Definition(err)
    }
}

impl From<StateError> for Error {
    fn from(err: StateError) -> Self {
        Error::State(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err.to_string())
    }
}

/// Result type alias for MockDB operations.
pub type Result<T> = std::result::Result<T, Error>;
