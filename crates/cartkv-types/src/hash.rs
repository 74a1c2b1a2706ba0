use std::fmt;

use serde::{Deserialize, Serialize};

/// A 32-byte BLAKE3 content hash.
///
/// Used for item identity keys and for script digests. Identical content
/// hashed under the same domain always produces the same `ContentHash`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Create a `ContentHash` from a pre-computed hash.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.short_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Identity key of a cart item: the hash of `"{type}/{id}"`.
///
/// Stable across processes and used for logging and deduplication. It is
/// never used as a storage key.
pub type ItemKey = ContentHash;

/// Domain-separated BLAKE3 content hasher.
///
/// The domain tag is prepended to every hash computation so an item key and
/// a script digest over identical bytes never collide.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for item identity keys.
    pub const ITEM: Self = Self {
        domain: "cartkv-item-v1",
    };
    /// Hasher for store script digests.
    pub const SCRIPT: Self = Self {
        domain: "cartkv-script-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ContentHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ContentHash::from_hash(*hasher.finalize().as_bytes())
    }
}

/// Compute the identity key of an item from its type and id.
pub fn item_key(item_type: &str, id: &str) -> ItemKey {
    ContentHasher::ITEM.hash(format!("{item_type}/{id}").as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_key_is_deterministic() {
        assert_eq!(item_key("Book", "1"), item_key("Book", "1"));
    }

    #[test]
    fn item_key_depends_on_type_and_id() {
        assert_ne!(item_key("Book", "1"), item_key("Book", "2"));
        assert_ne!(item_key("Book", "1"), item_key("Pen", "1"));
    }

    #[test]
    fn item_key_joins_with_slash() {
        let expected = ContentHasher::ITEM.hash(b"Book/1");
        assert_eq!(item_key("Book", "1"), expected);
    }

    #[test]
    fn domains_are_separated() {
        let data = b"Book/1";
        assert_ne!(ContentHasher::ITEM.hash(data), ContentHasher::SCRIPT.hash(data));
    }

    #[test]
    fn hex_forms() {
        let key = item_key("Pen", "5");
        assert_eq!(key.to_hex().len(), 64);
        assert_eq!(key.to_string(), key.to_hex());
        assert_eq!(key.short_hex().len(), 8);
        assert_eq!(format!("{key:?}"), format!("ContentHash({})", key.short_hex()));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn hex_form_is_stable(type_name in "[A-Za-z]{1,12}", id in "[0-9a-z-]{1,16}") {
                let key = item_key(&type_name, &id);
                let hex = key.to_hex();
                prop_assert_eq!(hex.len(), 64);
                prop_assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
                prop_assert!(hex.starts_with(&key.short_hex()));
            }
        }
    }
}
