use thiserror::Error;

#[derive(Debug, Error)]
pub enum CartError {
    #[error("store error: {0}")]
    Store(#[from] cartkv_store::StoreError),

    #[error("{0}")]
    Type(#[from] cartkv_types::TypeError),

    #[error("invalid cart id {0:?}: ids must not contain ':'")]
    InvalidCartId(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CartError {
    /// Whether this error is dynamic access to an undeclared field.
    pub fn is_unknown_field(&self) -> bool {
        matches!(
            self,
            Self::Type(cartkv_types::TypeError::UnknownField { .. })
        )
    }
}

pub type CartResult<T> = Result<T, CartError>;
