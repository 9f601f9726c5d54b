//! Error types for document construction.

use thiserror::Error;

use crate::value::ValueKind;

/// A fail-fast error raised while building a typed structure from a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructError {
    #[error("{field} must be of type {expected}")]
    FieldTypeMismatch { field: String, expected: ValueKind },

    #[error("{field} must be a (name, arguments) tuple: {reason}")]
    MalformedTuple { field: String, reason: String },
}

impl ConstructError {
    pub fn type_mismatch(field: impl Into<String>, expected: ValueKind) -> Self {
        ConstructError::FieldTypeMismatch {
            field: field.into(),
            expected,
        }
    }

    pub fn malformed_tuple(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConstructError::MalformedTuple {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// The (possibly nested) key the error refers to.
    pub fn field(&self) -> &str {
        match self {
            ConstructError::FieldTypeMismatch { field, .. }
            | ConstructError::MalformedTuple { field, .. } => field,
        }
    }

    /// Re-key the error under a parent field, e.g. `ssl` -> `DB_CONNECTION_ARGS.ssl`.
    pub fn within(self, parent: &str) -> Self {
        let join = |field: String| {
            if field.starts_with('[') {
                format!("{parent}{field}")
            } else {
                format!("{parent}.{field}")
            }
        };
        match self {
            ConstructError::FieldTypeMismatch { field, expected } => {
                ConstructError::FieldTypeMismatch {
                    field: join(field),
                    expected,
                }
            }
            ConstructError::MalformedTuple { field, reason } => ConstructError::MalformedTuple {
                field: join(field),
                reason,
            },
        }
    }
}

/// A mapping key that has no text representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("mapping key {key} at {path} cannot be represented as text")]
pub struct KeyCoercionError {
    /// Debug rendering of the offending key.
    pub key: String,
    /// Dotted path of the mapping that holds the key (`$` is the root).
    pub path: String,
}

pub type ConstructResult<T> = std::result::Result<T, ConstructError>;
