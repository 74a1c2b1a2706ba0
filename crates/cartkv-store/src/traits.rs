use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use cartkv_types::ContentHash;

use crate::error::StoreResult;
use crate::script::Script;
use crate::value::{ScriptReply, Ttl};

/// Client handle to a key-value store.
///
/// All implementations must satisfy these invariants:
/// - Each call is one synchronous request/response; there is no batching or
///   pipelining across calls.
/// - Reading a key through an operation of the wrong value kind fails with
///   [`StoreError::WrongType`](crate::StoreError::WrongType) and never coerces.
/// - Expired keys are indistinguishable from missing keys.
/// - A script runs as one indivisible unit: no other client observes the
///   keyspace between its first and last step.
/// - Timeouts and cancellation are the client's concern, not the caller's.
pub trait KvStore: Send + Sync {
    /// Read a string value. `Ok(None)` if the key does not exist.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a string value, replacing whatever the key held.
    ///
    /// With `ttl: None` the key becomes persistent.
    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()>;

    /// Delete a key of any kind. Returns `true` if it existed.
    fn del(&self, key: &str) -> StoreResult<bool>;

    /// Whether a key exists.
    fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Rename a key, carrying its value and TTL and replacing `to`.
    ///
    /// Fails with [`StoreError::NoSuchKey`](crate::StoreError::NoSuchKey) if
    /// `from` does not exist.
    fn rename(&self, from: &str, to: &str) -> StoreResult<()>;

    /// Remaining time-to-live of a key.
    fn ttl(&self, key: &str) -> StoreResult<Ttl>;

    /// Set a key to expire after `ttl`. Returns `false` if the key is missing.
    fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool>;

    /// Remove a key's expiry. Returns `false` if the key is missing or had none.
    fn persist(&self, key: &str) -> StoreResult<bool>;

    /// Members of a set. A missing key reads as the empty set.
    fn smembers(&self, key: &str) -> StoreResult<BTreeSet<String>>;

    /// Add members to a set, returning how many were new.
    fn sadd(&self, key: &str, members: &[String]) -> StoreResult<usize>;

    /// All fields of a hash. A missing key reads as the empty map.
    fn hgetall(&self, key: &str) -> StoreResult<BTreeMap<String, String>>;

    /// Set fields of a hash, returning how many were new.
    fn hset(&self, key: &str, fields: &BTreeMap<String, String>) -> StoreResult<usize>;

    /// Keys matching a glob pattern (`*`, `?`, `[...]`, `\` escapes), sorted.
    fn keys(&self, pattern: &str) -> StoreResult<Vec<String>>;

    /// Run a script the server already holds, by digest.
    ///
    /// Fails with [`StoreError::NoScript`](crate::StoreError::NoScript) if
    /// the server has never seen the body.
    fn eval_digest(
        &self,
        digest: &ContentHash,
        keys: &[String],
        args: &[String],
    ) -> StoreResult<ScriptReply>;

    /// Submit a script body and run it. The server caches the body under its
    /// digest for later [`KvStore::eval_digest`] calls.
    fn eval(&self, script: &Script, keys: &[String], args: &[String]) -> StoreResult<ScriptReply>;
}

/// The keyspace as seen from inside a running script.
///
/// Operations take `&mut self`: a script has exclusive access for its whole
/// run. Semantics match the corresponding [`KvStore`] methods.
pub trait Keyspace {
    fn get(&mut self, key: &str) -> StoreResult<Option<String>>;

    fn set(&mut self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()>;

    fn del(&mut self, key: &str) -> StoreResult<bool>;

    fn smembers(&mut self, key: &str) -> StoreResult<BTreeSet<String>>;

    fn hgetall(&mut self, key: &str) -> StoreResult<BTreeMap<String, String>>;

    fn keys(&mut self, pattern: &str) -> StoreResult<Vec<String>>;
}
