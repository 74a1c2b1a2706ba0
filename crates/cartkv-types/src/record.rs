use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{TypeError, TypeResult};
use crate::hash::{item_key, ItemKey};
use crate::value::FieldValue;

/// Name of the mandatory identifier field.
pub const ID_FIELD: &str = "id";
/// Name of the mandatory type field.
pub const TYPE_FIELD: &str = "type";

/// One cart line item: a map from field name to value.
///
/// Every record carries `id` and `type`. The set of field names is fixed when
/// the record is built (or decoded): [`Record::get`] and [`Record::set`]
/// reject any other name, so a misspelled field can never create new state.
/// `id` and `type` are readable but not settable, since they are the
/// record's position in the [`ItemIndex`](crate::ItemIndex).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "BTreeMap<String, FieldValue>")]
pub struct Record {
    id: String,
    item_type: String,
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Build a record from its identity and additional fields.
    ///
    /// `id` and `item_type` take precedence over any `id`/`type` entries in
    /// `fields`.
    pub fn new<I, K, V>(id: impl Into<String>, item_type: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let id = id.into();
        let item_type = item_type.into();
        let mut map: BTreeMap<String, FieldValue> = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        map.insert(ID_FIELD.to_string(), FieldValue::Text(id.clone()));
        map.insert(TYPE_FIELD.to_string(), FieldValue::Text(item_type.clone()));
        Self {
            id,
            item_type,
            fields: map,
        }
    }

    /// Build a record from a raw field map, as found in storage.
    pub fn from_fields(fields: BTreeMap<String, FieldValue>) -> TypeResult<Self> {
        let id = key_field(&fields, ID_FIELD)?;
        let item_type = key_field(&fields, TYPE_FIELD)?;
        Ok(Self {
            id,
            item_type,
            fields,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn item_type(&self) -> &str {
        &self.item_type
    }

    /// Identity key of this record: the content hash of `"{type}/{id}"`.
    pub fn key(&self) -> ItemKey {
        item_key(&self.item_type, &self.id)
    }

    /// All fields, including `id` and `type`.
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Whether `field` is one of the record's declared fields.
    pub fn declares(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Read a declared field.
    pub fn get(&self, field: &str) -> TypeResult<&FieldValue> {
        self.fields
            .get(field)
            .ok_or_else(|| self.unknown_field(field))
    }

    /// Overwrite a declared field, returning the previous value.
    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) -> TypeResult<FieldValue> {
        if field == ID_FIELD || field == TYPE_FIELD {
            return Err(TypeError::ReadOnlyField {
                field: field.to_string(),
            });
        }
        match self.fields.get_mut(field) {
            Some(slot) => Ok(std::mem::replace(slot, value.into())),
            None => Err(self.unknown_field(field)),
        }
    }

    /// Read a field without the declared-field check; absent reads as `None`.
    ///
    /// Used for configured fields such as unit cost and quantity, which a
    /// record may legitimately lack.
    pub fn lookup(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    fn unknown_field(&self, field: &str) -> TypeError {
        TypeError::UnknownField {
            item_type: self.item_type.clone(),
            id: self.id.clone(),
            field: field.to_string(),
        }
    }
}

impl TryFrom<BTreeMap<String, FieldValue>> for Record {
    type Error = TypeError;

    fn try_from(fields: BTreeMap<String, FieldValue>) -> TypeResult<Self> {
        Self::from_fields(fields)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

fn key_field(fields: &BTreeMap<String, FieldValue>, name: &'static str) -> TypeResult<String> {
    let value = fields.get(name).ok_or(TypeError::MissingField(name))?;
    value
        .as_key()
        .map(|s| s.into_owned())
        .ok_or_else(|| TypeError::InvalidKeyField {
            field: name,
            value: value.to_string(),
        })
}
