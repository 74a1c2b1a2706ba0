use cartkv_types::ContentHash;

/// Errors from key-value store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key holds a value of a different kind than the operation expects.
    #[error("wrong kind of value at {key}: expected {expected}, found {found}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The operation requires an existing key.
    #[error("no such key: {0}")]
    NoSuchKey(String),

    /// The server has no script cached under this digest.
    #[error("no script cached for digest {0}")]
    NoScript(ContentHash),

    /// A script ran but failed.
    #[error("script {name} failed: {reason}")]
    Script { name: String, reason: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A backend lock was poisoned by a panicking writer.
    #[error("store lock poisoned: {0}")]
    Poisoned(String),
}

impl StoreError {
    /// Returns `true` if this error signals a value of an unexpected kind.
    pub fn is_wrong_type(&self) -> bool {
        matches!(self, Self::WrongType { .. })
    }

    /// Returns `true` if this error signals an unknown script digest.
    pub fn is_no_script(&self) -> bool {
        matches!(self, Self::NoScript(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
