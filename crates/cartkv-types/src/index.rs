use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};
use crate::record::Record;

/// Records of one item type, keyed by item id.
pub type TypeBucket = BTreeMap<String, Record>;

/// In-memory index of a cart's line items: `type -> id -> Record`.
///
/// Both levels are ordered maps, so iteration order and the serialized form
/// are deterministic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemIndex {
    types: BTreeMap<String, TypeBucket>,
}

impl ItemIndex {
    /// Create an empty index.
    pub const fn new() -> Self {
        Self {
            types: BTreeMap::new(),
        }
    }

    /// The bucket for `item_type`, if any record of that type was ever filed.
    pub fn bucket(&self, item_type: &str) -> Option<&TypeBucket> {
        self.types.get(item_type)
    }

    /// The bucket for `item_type`, inserting an empty one if absent.
    pub fn bucket_mut(&mut self, item_type: &str) -> &mut TypeBucket {
        self.types.entry(item_type.to_string()).or_default()
    }

    /// File a record under its own type and id, returning any record it
    /// replaced.
    pub fn insert(&mut self, record: Record) -> Option<Record> {
        let id = record.id().to_string();
        self.bucket_mut(record.item_type()).insert(id, record)
    }

    /// Remove a record. An emptied bucket is dropped.
    pub fn remove(&mut self, item_type: &str, id: &str) -> Option<Record> {
        let bucket = self.types.get_mut(item_type)?;
        let removed = bucket.remove(id);
        if bucket.is_empty() {
            self.types.remove(item_type);
        }
        removed
    }

    pub fn get(&self, item_type: &str, id: &str) -> Option<&Record> {
        self.types.get(item_type)?.get(id)
    }

    pub fn get_mut(&mut self, item_type: &str, id: &str) -> Option<&mut Record> {
        self.types.get_mut(item_type)?.get_mut(id)
    }

    pub fn contains(&self, item_type: &str, id: &str) -> bool {
        self.get(item_type, id).is_some()
    }

    /// All records, ordered by type then id.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.types.values().flat_map(|bucket| bucket.values())
    }

    /// Records of one type, ordered by id.
    pub fn iter_type<'a>(&'a self, item_type: &str) -> impl Iterator<Item = &'a Record> {
        self.types
            .get(item_type)
            .into_iter()
            .flat_map(|bucket| bucket.values())
    }

    /// Item types present in the index.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Total number of records across all types.
    pub fn len(&self) -> usize {
        self.types.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check that every record is filed under its own type and id.
    pub fn validate(&self) -> TypeResult<()> {
        for (item_type, bucket) in &self.types {
            for (id, record) in bucket {
                if record.item_type() != item_type || record.id() != id {
                    return Err(TypeError::MisfiledRecord {
                        expected: format!("{item_type}/{id}"),
                        actual: format!("{}/{}", record.item_type(), record.id()),
                    });
                }
            }
        }
        Ok(())
    }
}

impl FromIterator<Record> for ItemIndex {
    fn from_iter<T: IntoIterator<Item = Record>>(iter: T) -> Self {
        let mut index = Self::new();
        for record in iter {
            index.insert(record);
        }
        index
    }
}

/// The persisted form of a cart: `{"id": .., "items": {type: {id: record}}}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CartDocument {
    pub id: String,
    #[serde(default)]
    pub items: ItemIndex,
}

impl CartDocument {
    pub fn new(id: impl Into<String>, items: ItemIndex) -> Self {
        Self {
            id: id.into(),
            items,
        }
    }

    /// Encode as compact JSON.
    pub fn to_json(&self) -> TypeResult<String> {
        Self::encode(&self.id, &self.items)
    }

    /// Encode a cart's id and items as a document without taking ownership.
    pub fn encode(id: &str, items: &ItemIndex) -> TypeResult<String> {
        #[derive(Serialize)]
        struct Borrowed<'a> {
            id: &'a str,
            items: &'a ItemIndex,
        }
        serde_json::to_string(&Borrowed { id, items })
            .map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Decode from JSON, rejecting records filed under the wrong type or id.
    pub fn from_json(json: &str) -> TypeResult<Self> {
        let doc: Self =
            serde_json::from_str(json).map_err(|e| TypeError::Serialization(e.to_string()))?;
        doc.items.validate()?;
        Ok(doc)
    }
}
