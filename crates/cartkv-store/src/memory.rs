use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use cartkv_types::ContentHash;

use crate::clock::{duration_ms, Clock, SystemClock};
use crate::error::{StoreError, StoreResult};
use crate::pattern::glob_match;
use crate::script::{Script, ScriptHandler};
use crate::snapshot::{KeyspaceSnapshot, StoredEntry};
use crate::traits::{Keyspace, KvStore};
use crate::value::{KvValue, ScriptReply, Ttl};

/// Counters of script invocations seen by an [`InMemoryKvStore`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScriptStats {
    /// `eval_digest` calls that found a cached script.
    pub digest_hits: u64,
    /// `eval_digest` calls that failed with `NoScript`.
    pub digest_misses: u64,
    /// `eval` calls (full body submitted).
    pub body_submissions: u64,
}

impl ScriptStats {
    /// Number of times any script body actually ran.
    pub fn runs(&self) -> u64 {
        self.digest_hits + self.body_submissions
    }
}

#[derive(Debug, Default)]
struct ScriptCounters {
    digest_hits: AtomicU64,
    digest_misses: AtomicU64,
    body_submissions: AtomicU64,
}

/// In-memory key-value store with expiry and atomic scripts.
///
/// Intended for tests, the CLI, and embedding. The whole keyspace sits behind
/// one `RwLock`; every operation, and every script run, holds the write side
/// for its duration, which is what makes scripts atomic. Expired keys are
/// dropped lazily when touched, or eagerly by [`InMemoryKvStore::purge_expired`].
pub struct InMemoryKvStore {
    entries: RwLock<BTreeMap<String, StoredEntry>>,
    scripts: RwLock<HashMap<ContentHash, ScriptHandler>>,
    clock: Arc<dyn Clock>,
    counters: ScriptCounters,
}

impl InMemoryKvStore {
    /// Create an empty store on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store on the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            scripts: RwLock::new(HashMap::new()),
            clock,
            counters: ScriptCounters::default(),
        }
    }

    /// Restore a store from a snapshot. The script cache starts empty.
    pub fn from_snapshot(snapshot: KeyspaceSnapshot, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(snapshot.entries),
            scripts: RwLock::new(HashMap::new()),
            clock,
            counters: ScriptCounters::default(),
        }
    }

    /// Copy out every live key.
    pub fn snapshot(&self) -> StoreResult<KeyspaceSnapshot> {
        let now_ms = self.clock.now_ms();
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(KeyspaceSnapshot {
            entries: entries
                .iter()
                .filter(|(_, entry)| !entry.is_expired(now_ms))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        })
    }

    /// Number of live keys.
    pub fn len(&self) -> StoreResult<usize> {
        let now_ms = self.clock.now_ms();
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.values().filter(|e| !e.is_expired(now_ms)).count())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Kind of value held at `key`, if it exists.
    pub fn kind(&self, key: &str) -> StoreResult<Option<&'static str>> {
        self.session(|s| Ok(s.entry(key).map(|e| e.value.kind())))
    }

    /// Drop every expired key now, returning how many were removed.
    pub fn purge_expired(&self) -> StoreResult<usize> {
        let now_ms = self.clock.now_ms();
        let mut entries = self.entries.write().map_err(poisoned)?;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now_ms));
        Ok(before - entries.len())
    }

    /// Forget every cached script, as a server restart would.
    pub fn flush_scripts(&self) -> StoreResult<()> {
        self.scripts.write().map_err(poisoned)?.clear();
        Ok(())
    }

    /// Whether a script is cached under `digest`.
    pub fn has_script(&self, digest: &ContentHash) -> StoreResult<bool> {
        Ok(self.scripts.read().map_err(poisoned)?.contains_key(digest))
    }

    pub fn script_stats(&self) -> ScriptStats {
        ScriptStats {
            digest_hits: self.counters.digest_hits.load(Ordering::SeqCst),
            digest_misses: self.counters.digest_misses.load(Ordering::SeqCst),
            body_submissions: self.counters.body_submissions.load(Ordering::SeqCst),
        }
    }

    fn session<T>(&self, f: impl FnOnce(&mut Session<'_>) -> StoreResult<T>) -> StoreResult<T> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        let mut session = Session {
            entries: &mut entries,
            now_ms: self.clock.now_ms(),
        };
        f(&mut session)
    }

    fn run(
        &self,
        handler: ScriptHandler,
        keys: &[String],
        args: &[String],
    ) -> StoreResult<ScriptReply> {
        self.session(|session| handler(session, keys, args))
    }
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys = self.len().unwrap_or(0);
        f.debug_struct("InMemoryKvStore")
            .field("key_count", &keys)
            .field("scripts", &self.script_stats())
            .finish()
    }
}

impl KvStore for InMemoryKvStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.session(|s| s.get(key))
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        self.session(|s| s.set(key, value, ttl))
    }

    fn del(&self, key: &str) -> StoreResult<bool> {
        self.session(|s| s.del(key))
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        self.session(|s| Ok(s.entry(key).is_some()))
    }

    fn rename(&self, from: &str, to: &str) -> StoreResult<()> {
        self.session(|s| s.rename(from, to))
    }

    fn ttl(&self, key: &str) -> StoreResult<Ttl> {
        self.session(|s| Ok(s.ttl(key)))
    }

    fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        self.session(|s| Ok(s.expire(key, ttl)))
    }

    fn persist(&self, key: &str) -> StoreResult<bool> {
        self.session(|s| {
            Ok(s.entry(key)
                .is_some_and(|entry| entry.expires_at_ms.take().is_some()))
        })
    }

    fn smembers(&self, key: &str) -> StoreResult<BTreeSet<String>> {
        self.session(|s| s.smembers(key))
    }

    fn sadd(&self, key: &str, members: &[String]) -> StoreResult<usize> {
        self.session(|s| s.sadd(key, members))
    }

    fn hgetall(&self, key: &str) -> StoreResult<BTreeMap<String, String>> {
        self.session(|s| s.hgetall(key))
    }

    fn hset(&self, key: &str, fields: &BTreeMap<String, String>) -> StoreResult<usize> {
        self.session(|s| s.hset(key, fields))
    }

    fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        self.session(|s| s.keys(pattern))
    }

    fn eval_digest(
        &self,
        digest: &ContentHash,
        keys: &[String],
        args: &[String],
    ) -> StoreResult<ScriptReply> {
        let handler = self.scripts.read().map_err(poisoned)?.get(digest).copied();
        match handler {
            Some(handler) => {
                self.counters.digest_hits.fetch_add(1, Ordering::SeqCst);
                self.run(handler, keys, args)
            }
            None => {
                self.counters.digest_misses.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::NoScript(*digest))
            }
        }
    }

    fn eval(&self, script: &Script, keys: &[String], args: &[String]) -> StoreResult<ScriptReply> {
        self.counters.body_submissions.fetch_add(1, Ordering::SeqCst);
        self.scripts
            .write()
            .map_err(poisoned)?
            .insert(script.digest(), script.handler());
        self.run(script.handler(), keys, args)
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Poisoned(e.to_string())
}

/// Exclusive view of the keyspace at one instant.
struct Session<'a> {
    entries: &'a mut BTreeMap<String, StoredEntry>,
    now_ms: u64,
}

impl Session<'_> {
    /// The live entry at `key`, dropping it first if it has expired.
    fn entry(&mut self, key: &str) -> Option<&mut StoredEntry> {
        let now_ms = self.now_ms;
        if self.entries.get(key).is_some_and(|e| e.is_expired(now_ms)) {
            self.entries.remove(key);
        }
        self.entries.get_mut(key)
    }

    fn deadline(&self, ttl: Duration) -> u64 {
        self.now_ms.saturating_add(duration_ms(ttl))
    }

    fn rename(&mut self, from: &str, to: &str) -> StoreResult<()> {
        if self.entry(from).is_none() {
            return Err(StoreError::NoSuchKey(from.to_string()));
        }
        if let Some(entry) = self.entries.remove(from) {
            self.entries.insert(to.to_string(), entry);
        }
        Ok(())
    }

    fn ttl(&mut self, key: &str) -> Ttl {
        let now_ms = self.now_ms;
        match self.entry(key) {
            None => Ttl::Missing,
            Some(StoredEntry {
                expires_at_ms: None,
                ..
            }) => Ttl::Persistent,
            Some(StoredEntry {
                expires_at_ms: Some(at),
                ..
            }) => Ttl::Expires(Duration::from_millis(at.saturating_sub(now_ms))),
        }
    }

    fn expire(&mut self, key: &str, ttl: Duration) -> bool {
        let deadline = self.deadline(ttl);
        match self.entry(key) {
            Some(entry) => {
                entry.expires_at_ms = Some(deadline);
                true
            }
            None => false,
        }
    }

    fn sadd(&mut self, key: &str, members: &[String]) -> StoreResult<usize> {
        if self.entry(key).is_none() {
            if members.is_empty() {
                return Ok(0);
            }
            self.entries
                .insert(key.to_string(), StoredEntry::new(KvValue::Set(BTreeSet::new())));
        }
        match self.entry(key).map(|e| &mut e.value) {
            Some(KvValue::Set(set)) => Ok(members
                .iter()
                .filter(|m| set.insert((*m).clone()))
                .count()),
            Some(other) => Err(wrong_type(key, "set", other)),
            None => Ok(0),
        }
    }

    fn hset(&mut self, key: &str, fields: &BTreeMap<String, String>) -> StoreResult<usize> {
        if self.entry(key).is_none() {
            if fields.is_empty() {
                return Ok(0);
            }
            self.entries
                .insert(key.to_string(), StoredEntry::new(KvValue::Hash(BTreeMap::new())));
        }
        match self.entry(key).map(|e| &mut e.value) {
            Some(KvValue::Hash(hash)) => Ok(fields
                .iter()
                .filter(|(k, v)| hash.insert((*k).clone(), (*v).clone()).is_none())
                .count()),
            Some(other) => Err(wrong_type(key, "hash", other)),
            None => Ok(0),
        }
    }
}

impl Keyspace for Session<'_> {
    fn get(&mut self, key: &str) -> StoreResult<Option<String>> {
        match self.entry(key).map(|e| &e.value) {
            None => Ok(None),
            Some(KvValue::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(wrong_type(key, "string", other)),
        }
    }

    fn set(&mut self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        let expires_at_ms = ttl.map(|ttl| self.deadline(ttl));
        self.entries.insert(
            key.to_string(),
            StoredEntry {
                value: KvValue::String(value.to_string()),
                expires_at_ms,
            },
        );
        Ok(())
    }

    fn del(&mut self, key: &str) -> StoreResult<bool> {
        let existed = self.entry(key).is_some();
        self.entries.remove(key);
        Ok(existed)
    }

    fn smembers(&mut self, key: &str) -> StoreResult<BTreeSet<String>> {
        match self.entry(key).map(|e| &e.value) {
            None => Ok(BTreeSet::new()),
            Some(KvValue::Set(set)) => Ok(set.clone()),
            Some(other) => Err(wrong_type(key, "set", other)),
        }
    }

    fn hgetall(&mut self, key: &str) -> StoreResult<BTreeMap<String, String>> {
        match self.entry(key).map(|e| &e.value) {
            None => Ok(BTreeMap::new()),
            Some(KvValue::Hash(hash)) => Ok(hash.clone()),
            Some(other) => Err(wrong_type(key, "hash", other)),
        }
    }

    fn keys(&mut self, pattern: &str) -> StoreResult<Vec<String>> {
        let now_ms = self.now_ms;
        Ok(self
            .entries
            .iter()
            .filter(|(key, entry)| !entry.is_expired(now_ms) && glob_match(pattern, key))
            .map(|(key, _)| key.clone())
            .collect())
    }
}

fn wrong_type(key: &str, expected: &'static str, found: &KvValue) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
        expected,
        found: found.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::script::invoke_script;

    fn store() -> (Arc<ManualClock>, InMemoryKvStore) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let store = InMemoryKvStore::with_clock(clock.clone());
        (clock, store)
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    // -----------------------------------------------------------------------
    // Strings and keys
    // -----------------------------------------------------------------------

    #[test]
    fn set_get_del() {
        let (_, store) = store();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v", None).unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        assert!(store.exists("k").unwrap());
        assert!(store.del("k").unwrap());
        assert!(!store.del("k").unwrap());
        assert!(!store.exists("k").unwrap());
    }

    #[test]
    fn set_replaces_any_kind() {
        let (_, store) = store();
        store.sadd("k", &strings(&["a"])).unwrap();
        store.set("k", "doc", None).unwrap();
        assert_eq!(store.kind("k").unwrap(), Some("string"));
    }

    #[test]
    fn get_on_set_is_wrong_type() {
        let (_, store) = store();
        store.sadd("cart:1", &strings(&["Book:1"])).unwrap();
        let err = store.get("cart:1").unwrap_err();
        assert!(err.is_wrong_type());
        assert_eq!(
            err.to_string(),
            "wrong kind of value at cart:1: expected string, found set"
        );
    }

    #[test]
    fn set_and_hash_reads_reject_strings() {
        let (_, store) = store();
        store.set("k", "v", None).unwrap();
        assert!(store.smembers("k").unwrap_err().is_wrong_type());
        assert!(store.hgetall("k").unwrap_err().is_wrong_type());
        assert!(store.sadd("k", &strings(&["a"])).unwrap_err().is_wrong_type());
        assert!(store.hset("k", &BTreeMap::new()).unwrap_err().is_wrong_type());
    }

    #[test]
    fn sets_and_hashes() {
        let (_, store) = store();
        assert!(store.smembers("s").unwrap().is_empty());
        assert_eq!(store.sadd("s", &strings(&["a", "b", "a"])).unwrap(), 2);
        assert_eq!(store.sadd("s", &strings(&["b", "c"])).unwrap(), 1);
        assert_eq!(store.smembers("s").unwrap().len(), 3);

        let fields: BTreeMap<String, String> =
            [("id".to_string(), "1".to_string())].into_iter().collect();
        assert_eq!(store.hset("h", &fields).unwrap(), 1);
        assert_eq!(store.hset("h", &fields).unwrap(), 0);
        assert_eq!(store.hgetall("h").unwrap(), fields);
        assert!(store.hgetall("missing").unwrap().is_empty());
    }

    #[test]
    fn empty_writes_do_not_create_keys() {
        let (_, store) = store();
        assert_eq!(store.sadd("s", &[]).unwrap(), 0);
        assert_eq!(store.hset("h", &BTreeMap::new()).unwrap(), 0);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn keys_are_sorted_glob_matches() {
        let (_, store) = store();
        for key in ["cart:42", "cart:42:Pen:5", "cart:42:Book:1", "cart:420:Book:1"] {
            store.set(key, "x", None).unwrap();
        }
        assert_eq!(
            store.keys("cart:42:*").unwrap(),
            strings(&["cart:42:Book:1", "cart:42:Pen:5"])
        );
        assert_eq!(store.keys("*").unwrap().len(), 4);
    }

    // -----------------------------------------------------------------------
    // Expiry
    // -----------------------------------------------------------------------

    #[test]
    fn ttl_states() {
        let (clock, store) = store();
        assert_eq!(store.ttl("k").unwrap(), Ttl::Missing);
        store.set("k", "v", None).unwrap();
        assert_eq!(store.ttl("k").unwrap(), Ttl::Persistent);
        assert!(store.expire("k", Duration::from_secs(10)).unwrap());
        assert_eq!(store.ttl("k").unwrap(), Ttl::Expires(Duration::from_secs(10)));
        clock.advance(Duration::from_secs(4));
        assert_eq!(store.ttl("k").unwrap(), Ttl::Expires(Duration::from_secs(6)));
        assert!(store.persist("k").unwrap());
        assert!(!store.persist("k").unwrap());
        assert_eq!(store.ttl("k").unwrap(), Ttl::Persistent);
        assert!(!store.expire("missing", Duration::from_secs(1)).unwrap());
    }

    #[test]
    fn expired_keys_vanish() {
        let (clock, store) = store();
        store.set("k", "v", Some(Duration::from_secs(5))).unwrap();
        store.set("other", "v", Some(Duration::from_secs(50))).unwrap();
        clock.advance(Duration::from_secs(5));
        assert_eq!(store.get("k").unwrap(), None);
        assert_eq!(store.ttl("k").unwrap(), Ttl::Missing);
        assert_eq!(store.keys("*").unwrap(), strings(&["other"]));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn huge_ttl_saturates_instead_of_wrapping() {
        let (clock, store) = store();
        let ttl = Duration::from_secs(18_446_744_073_709_552);
        store.set("k", "v", Some(ttl)).unwrap();
        clock.advance(Duration::from_secs(1));
        assert!(store.exists("k").unwrap());
        let left = store.ttl("k").unwrap().remaining().unwrap();
        assert!(left > Duration::from_secs(365 * 24 * 60 * 60));
    }

    #[test]
    fn purge_expired_counts_removed() {
        let (clock, store) = store();
        store.set("a", "v", Some(Duration::from_secs(1))).unwrap();
        store.set("b", "v", Some(Duration::from_secs(1))).unwrap();
        store.set("c", "v", None).unwrap();
        clock.advance(Duration::from_secs(2));
        assert_eq!(store.purge_expired().unwrap(), 2);
        assert_eq!(store.purge_expired().unwrap(), 0);
    }

    #[test]
    fn set_without_ttl_clears_expiry() {
        let (_, store) = store();
        store.set("k", "v", Some(Duration::from_secs(5))).unwrap();
        store.set("k", "w", None).unwrap();
        assert_eq!(store.ttl("k").unwrap(), Ttl::Persistent);
    }

    // -----------------------------------------------------------------------
    // Rename
    // -----------------------------------------------------------------------

    #[test]
    fn rename_carries_value_and_ttl() {
        let (clock, store) = store();
        store.set("old", "doc", Some(Duration::from_secs(60))).unwrap();
        clock.advance(Duration::from_secs(10));
        store.set("new", "stale", None).unwrap();
        store.rename("old", "new").unwrap();
        assert_eq!(store.get("old").unwrap(), None);
        assert_eq!(store.get("new").unwrap().as_deref(), Some("doc"));
        assert_eq!(store.ttl("new").unwrap(), Ttl::Expires(Duration::from_secs(50)));
    }

    #[test]
    fn rename_missing_key_fails() {
        let (_, store) = store();
        assert!(matches!(
            store.rename("nope", "other"),
            Err(StoreError::NoSuchKey(key)) if key == "nope"
        ));
    }

    #[test]
    fn rename_onto_itself_keeps_value() {
        let (_, store) = store();
        store.set("k", "v", None).unwrap();
        store.rename("k", "k").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    // -----------------------------------------------------------------------
    // Scripts
    // -----------------------------------------------------------------------

    fn copy_then_delete(
        ks: &mut dyn Keyspace,
        keys: &[String],
        _args: &[String],
    ) -> StoreResult<ScriptReply> {
        let value = ks.get(&keys[0])?.unwrap_or_default();
        ks.set(&keys[1], &value, None)?;
        ks.del(&keys[0])?;
        Ok(ScriptReply::Text(value))
    }

    static MOVE: Script = Script::new(
        "move",
        "local v = redis.call('GET', KEYS[1]) redis.call('SET', KEYS[2], v) redis.call('DEL', KEYS[1]) return v",
        copy_then_delete,
    );

    #[test]
    fn unknown_digest_is_no_script() {
        let (_, store) = store();
        let err = store.eval_digest(&MOVE.digest(), &[], &[]).unwrap_err();
        assert!(err.is_no_script());
        assert_eq!(store.script_stats().digest_misses, 1);
    }

    #[test]
    fn eval_caches_body_under_digest() {
        let (_, store) = store();
        store.set("a", "1", None).unwrap();
        let keys = strings(&["a", "b"]);
        assert_eq!(
            store.eval(&MOVE, &keys, &[]).unwrap(),
            ScriptReply::Text("1".into())
        );
        assert!(store.has_script(&MOVE.digest()).unwrap());

        let back = strings(&["b", "a"]);
        store.eval_digest(&MOVE.digest(), &back, &[]).unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("b").unwrap(), None);
        assert_eq!(
            store.script_stats(),
            ScriptStats {
                digest_hits: 1,
                digest_misses: 0,
                body_submissions: 1
            }
        );
    }

    #[test]
    fn invoke_falls_back_once_then_uses_digest() {
        let (_, store) = store();
        store.set("a", "1", None).unwrap();
        invoke_script(&store, &MOVE, &strings(&["a", "b"]), &[]).unwrap();
        invoke_script(&store, &MOVE, &strings(&["b", "a"]), &[]).unwrap();
        let stats = store.script_stats();
        assert_eq!(stats.digest_misses, 1);
        assert_eq!(stats.body_submissions, 1);
        assert_eq!(stats.digest_hits, 1);
        assert_eq!(stats.runs(), 2);
    }

    #[test]
    fn flush_scripts_forces_resubmission() {
        let (_, store) = store();
        invoke_script(&store, &MOVE, &strings(&["a", "b"]), &[]).unwrap();
        store.flush_scripts().unwrap();
        assert!(!store.has_script(&MOVE.digest()).unwrap());
        invoke_script(&store, &MOVE, &strings(&["b", "a"]), &[]).unwrap();
        assert_eq!(store.script_stats().body_submissions, 2);
    }

    fn fail_on_string(
        ks: &mut dyn Keyspace,
        keys: &[String],
        _args: &[String],
    ) -> StoreResult<ScriptReply> {
        ks.smembers(&keys[0])?;
        Ok(ScriptReply::Ok)
    }

    static MEMBERS: Script = Script::new(
        "members",
        "return redis.call('SMEMBERS', KEYS[1])",
        fail_on_string,
    );

    #[test]
    fn script_errors_propagate_through_invoke() {
        let (_, store) = store();
        store.set("k", "v", None).unwrap();
        let err = invoke_script(&store, &MEMBERS, &strings(&["k"]), &[]).unwrap_err();
        assert!(err.is_wrong_type());
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    #[test]
    fn snapshot_skips_expired_and_restores() {
        let (clock, store) = store();
        store.set("live", "v", Some(Duration::from_secs(60))).unwrap();
        store.set("dead", "v", Some(Duration::from_secs(1))).unwrap();
        store.sadd("set", &strings(&["x"])).unwrap();
        clock.advance(Duration::from_secs(2));

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.entries.len(), 2);

        let restored = InMemoryKvStore::from_snapshot(snapshot, clock.clone());
        assert_eq!(restored.get("live").unwrap().as_deref(), Some("v"));
        assert_eq!(
            restored.ttl("live").unwrap(),
            Ttl::Expires(Duration::from_secs(58))
        );
        assert_eq!(restored.smembers("set").unwrap().len(), 1);
    }
}
