//! Key-value store interface for cartkv.
//!
//! Carts live in an external key-value store with Redis-like semantics:
//! string, set, and hash values under flat keys, per-key expiry, and atomic
//! server-side scripts addressed by the digest of their body.
//!
//! # Storage Backends
//!
//! All backends implement the [`KvStore`] trait:
//!
//! - [`InMemoryKvStore`] -- `BTreeMap`-based store for tests, the CLI, and
//!   embedding, with [`KeyspaceSnapshot`] files for persistence
//!
//! # Design Rules
//!
//! 1. Reading a key as the wrong kind of value is an error, never a coercion.
//! 2. Expired keys behave exactly like missing keys.
//! 3. Scripts run atomically; callers reach them through [`invoke_script`],
//!    which sends the body only when the server lacks the digest.
//! 4. All backend errors are propagated, never silently ignored.

pub mod clock;
pub mod error;
pub mod memory;
pub mod pattern;
pub mod script;
pub mod snapshot;
pub mod traits;
pub mod value;

pub use clock::{duration_ms, Clock, ManualClock, SystemClock};
pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryKvStore, ScriptStats};
pub use script::{invoke_script, Script, ScriptHandler};
pub use snapshot::{KeyspaceSnapshot, StoredEntry};
pub use traits::{Keyspace, KvStore};
pub use value::{KvValue, ScriptReply, Ttl};
