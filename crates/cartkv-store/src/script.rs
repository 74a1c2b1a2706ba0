use std::fmt;
use std::sync::OnceLock;

use cartkv_types::{ContentHash, ContentHasher};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::{Keyspace, KvStore};
use crate::value::ScriptReply;

/// Native implementation of a script, run by in-process backends.
pub type ScriptHandler = fn(&mut dyn Keyspace, &[String], &[String]) -> StoreResult<ScriptReply>;

/// An atomic server-side procedure.
///
/// `body` is the source a network backend transmits (Lua, for a Redis-style
/// server). `handler` is the same procedure for backends that execute in
/// process. Both must describe the same behaviour. Scripts are identified on
/// the server by the digest of `body`, computed once per process.
pub struct Script {
    name: &'static str,
    body: &'static str,
    handler: ScriptHandler,
    digest: OnceLock<ContentHash>,
}

impl Script {
    pub const fn new(name: &'static str, body: &'static str, handler: ScriptHandler) -> Self {
        Self {
            name,
            body,
            handler,
            digest: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn body(&self) -> &'static str {
        self.body
    }

    pub fn handler(&self) -> ScriptHandler {
        self.handler
    }

    /// Content digest of the body; the reference the server caches it under.
    pub fn digest(&self) -> ContentHash {
        *self
            .digest
            .get_or_init(|| ContentHasher::SCRIPT.hash(self.body.as_bytes()))
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Script")
            .field("name", &self.name)
            .field("digest", &self.digest())
            .finish()
    }
}

/// Run a script by digest, submitting the full body only if the server does
/// not know the digest yet.
///
/// Any error other than [`StoreError::NoScript`] from the first attempt, and
/// any error at all from the fallback, is returned unchanged.
pub fn invoke_script(
    store: &dyn KvStore,
    script: &Script,
    keys: &[String],
    args: &[String],
) -> StoreResult<ScriptReply> {
    let digest = script.digest();
    match store.eval_digest(&digest, keys, args) {
        Err(StoreError::NoScript(_)) => {
            warn!(script = script.name, digest = %digest.short_hex(), "script not cached; sending body");
            store.eval(script, keys, args)
        }
        other => {
            debug!(script = script.name, digest = %digest.short_hex(), "script run by digest");
            other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut dyn Keyspace, _: &[String], _: &[String]) -> StoreResult<ScriptReply> {
        Ok(ScriptReply::Nil)
    }

    static NOOP: Script = Script::new("noop", "return nil", noop);

    #[test]
    fn digest_is_body_hash() {
        assert_eq!(NOOP.digest(), ContentHasher::SCRIPT.hash(b"return nil"));
        assert_eq!(NOOP.digest(), NOOP.digest());
    }

    #[test]
    fn debug_shows_name_and_digest() {
        let rendered = format!("{NOOP:?}");
        assert!(rendered.contains("noop"));
        assert!(rendered.contains(&NOOP.digest().short_hex()));
    }
}
