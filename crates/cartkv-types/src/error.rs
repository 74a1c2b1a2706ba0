use thiserror::Error;

/// Errors produced by record and document operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    /// A record is missing one of its mandatory fields (`id` or `type`).
    #[error("record is missing required field `{0}`")]
    MissingField(&'static str),

    /// Dynamic access to a field the record was not constructed with.
    #[error("unknown field `{field}` on {item_type}/{id}")]
    UnknownField {
        item_type: String,
        id: String,
        field: String,
    },

    /// `id` and `type` cannot be changed through dynamic access.
    #[error("field `{field}` is read-only")]
    ReadOnlyField { field: String },

    /// A mandatory field holds a value that cannot be used as a key.
    #[error("field `{field}` must be a string or number, got {value}")]
    InvalidKeyField { field: &'static str, value: String },

    /// A record is filed under a type/id pair that disagrees with its fields.
    #[error("record {actual} is filed under {expected}")]
    MisfiledRecord { expected: String, actual: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result alias for type operations.
pub type TypeResult<T> = Result<T, TypeError>;
