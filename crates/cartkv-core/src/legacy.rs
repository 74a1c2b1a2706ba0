//! Writer for the legacy multi-key cart layout.
//!
//! Only used to seed stores (tests, fixtures, the CLI); carts are never saved
//! in this shape by [`Cart`](crate::Cart).

use std::collections::BTreeMap;

use cartkv_types::Record;
use tracing::debug;

use crate::config::CartContext;
use crate::error::CartResult;
use crate::keys::{cart_key, legacy_item_key};

/// Suffix under which a legacy item hash is referenced: `{type}:{id}`.
pub fn legacy_suffix(record: &Record) -> String {
    format!("{}:{}", record.item_type(), record.id())
}

/// Write `records` as a legacy cart: one set of suffixes at the cart key and
/// one hash per record. Field values are stored as text; null becomes `""`.
pub fn write_legacy_cart(ctx: &CartContext, cart_id: &str, records: &[Record]) -> CartResult<()> {
    let store = ctx.store();
    let ttl = ctx.settings().cart_expires_in();
    let key = cart_key(&ctx.settings().key_prefix, cart_id);

    let suffixes: Vec<String> = records.iter().map(legacy_suffix).collect();
    store.sadd(&key, &suffixes)?;
    store.expire(&key, ttl)?;
    for (record, suffix) in records.iter().zip(&suffixes) {
        let item_key = legacy_item_key(&key, suffix);
        let fields: BTreeMap<String, String> = record
            .fields()
            .iter()
            .map(|(field, value)| (field.clone(), value.to_text().into_owned()))
            .collect();
        store.hset(&item_key, &fields)?;
        store.expire(&item_key, ttl)?;
    }
    debug!(cart = cart_id, items = records.len(), "legacy cart written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use cartkv_store::{InMemoryKvStore, KvStore};
    use cartkv_types::FieldValue;

    use crate::config::CartSettings;

    #[test]
    fn writes_set_and_hashes() {
        let store = Arc::new(InMemoryKvStore::new());
        let ctx = CartContext::new(CartSettings::default(), store.clone()).unwrap();
        let pen = Record::new(
            "5",
            "Pen",
            [("quantity", FieldValue::Int(10)), ("note", FieldValue::Null)],
        );
        write_legacy_cart(&ctx, "42", &[pen]).unwrap();

        assert_eq!(
            store.smembers("cart:42").unwrap().into_iter().collect::<Vec<_>>(),
            vec!["Pen:5".to_string()]
        );
        let hash = store.hgetall("cart:42:Pen:5").unwrap();
        assert_eq!(hash["quantity"], "10");
        assert_eq!(hash["note"], "");
        assert_eq!(hash["type"], "Pen");
        assert!(store.ttl("cart:42:Pen:5").unwrap().remaining().is_some());
        assert!(store.get("cart:42").unwrap_err().is_wrong_type());
    }
}
