use crate::field::{Field, FieldKind};

/// Errors from building or converting a draft record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("field '{field}' holds {expected} values, got {got}")]
    KindMismatch {
        field: Field,
        expected: FieldKind,
        got: FieldKind,
    },

    #[error("invalid value for field '{field}': {message}")]
    InvalidValue { field: Field, message: String },

    #[error("draft record must be a JSON object")]
    NotAnObject,

    #[error("unknown field '{0}'")]
    UnknownField(String),
}
