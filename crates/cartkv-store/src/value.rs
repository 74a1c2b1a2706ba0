use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A value held under one key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum KvValue {
    /// A scalar string (documents are stored this way).
    String(String),
    /// An unordered set of unique strings.
    Set(BTreeSet<String>),
    /// A flat field -> string map.
    Hash(BTreeMap<String, String>),
}

impl KvValue {
    /// Name of the value kind, as reported in [`StoreError::WrongType`](crate::StoreError::WrongType).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Set(_) => "set",
            Self::Hash(_) => "hash",
        }
    }
}

/// Remaining time-to-live of a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ttl {
    /// The key does not exist.
    Missing,
    /// The key exists and never expires.
    Persistent,
    /// The key expires after this duration.
    Expires(Duration),
}

impl Ttl {
    /// The remaining duration, if the key exists and expires.
    pub fn remaining(&self) -> Option<Duration> {
        match self {
            Self::Expires(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// What an atomic script returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptReply {
    Nil,
    Ok,
    Int(i64),
    Text(String),
}
