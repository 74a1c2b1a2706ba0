//! Atomic conversion of a legacy multi-key cart into a single document.
//!
//! Legacy carts keep a set of item suffixes at the cart key and one hash per
//! item at `{cart_key}:{suffix}`. The conversion reads them all, deletes every
//! legacy key, and writes the document with a fresh TTL, all inside one
//! server-side script so no reader ever sees a half-converted cart.
//!
//! Deletion covers the set key, every referenced item key, and every key
//! matching `{cart_key}:*`. The pattern sweep also removes keys nested under
//! the cart key that were never referenced by the set, including one written
//! by another client just before the script ran. Cart ids never contain `:`
//! (see [`validate_cart_id`]), so the sweep cannot reach another cart.

use std::time::Duration;

use cartkv_store::{
    duration_ms, invoke_script, Keyspace, Script, ScriptReply, StoreError, StoreResult,
};
use cartkv_types::{CartDocument, FieldValue, ItemIndex, Record};
use tracing::info;

use crate::config::CartContext;
use crate::error::CartResult;
use crate::keys::{legacy_item_key, legacy_item_pattern, validate_cart_id};

/// KEYS[1] = cart key; ARGV[1] = cart id, ARGV[2] = TTL in ms, ARGV[3] = glob
/// of nested keys. Returns the number of distinct items migrated, 0 if the
/// cart key already holds a document.
const MIGRATE_LEGACY_CART_LUA: &str = r#"
local cart_key = KEYS[1]
local cart_id = ARGV[1]
local ttl_ms = tonumber(ARGV[2])
local nested = ARGV[3]

if redis.call('TYPE', cart_key).ok == 'string' then
  return 0
end

local items = {}
local item_keys = {}
local count = 0
for _, suffix in ipairs(redis.call('SMEMBERS', cart_key)) do
  local item_key = cart_key .. ':' .. suffix
  table.insert(item_keys, item_key)
  local flat = redis.call('HGETALL', item_key)
  if #flat > 0 then
    local record = {}
    for i = 1, #flat, 2 do
      record[flat[i]] = flat[i + 1]
    end
    if record['id'] == nil or record['type'] == nil then
      return redis.error_reply('legacy item ' .. item_key .. ' has no id or type')
    end
    local bucket = items[record['type']] or {}
    items[record['type']] = bucket
    if bucket[record['id']] == nil then
      count = count + 1
    end
    bucket[record['id']] = record
  end
end

redis.call('DEL', cart_key)
for _, key in ipairs(redis.call('KEYS', nested)) do
  redis.call('DEL', key)
end
for _, key in ipairs(item_keys) do
  redis.call('DEL', key)
end

if next(items) == nil then
  items = cjson.decode('{}')
end
redis.call('SET', cart_key, cjson.encode({id = cart_id, items = items}), 'PX', ttl_ms)
return count
"#;

/// The legacy-to-document migration script.
pub static MIGRATE_LEGACY_CART: Script = Script::new(
    "migrate_legacy_cart",
    MIGRATE_LEGACY_CART_LUA,
    migrate_legacy_cart,
);

fn migrate_legacy_cart(
    ks: &mut dyn Keyspace,
    keys: &[String],
    args: &[String],
) -> StoreResult<ScriptReply> {
    let [cart_key] = keys else {
        return Err(script_error(format!("expected 1 key, got {}", keys.len())));
    };
    let [cart_id, ttl_ms, nested] = args else {
        return Err(script_error(format!("expected 3 args, got {}", args.len())));
    };
    let ttl_ms: u64 = ttl_ms
        .parse()
        .map_err(|_| script_error(format!("invalid ttl {ttl_ms:?}")))?;

    // Converted by a concurrent caller between its read and ours.
    if let Ok(Some(_)) = ks.get(cart_key) {
        return Ok(ScriptReply::Int(0));
    }

    let mut items = ItemIndex::new();
    let mut item_keys = Vec::new();
    for suffix in ks.smembers(cart_key)? {
        let item_key = legacy_item_key(cart_key, &suffix);
        let flat = ks.hgetall(&item_key)?;
        if !flat.is_empty() {
            let fields = flat
                .into_iter()
                .map(|(field, value)| (field, FieldValue::Text(value)))
                .collect();
            let record = Record::from_fields(fields)
                .map_err(|e| script_error(format!("legacy item {item_key}: {e}")))?;
            items.insert(record);
        }
        item_keys.push(item_key);
    }

    ks.del(cart_key)?;
    for key in ks.keys(nested)? {
        ks.del(&key)?;
    }
    for key in &item_keys {
        ks.del(key)?;
    }

    let document = CartDocument::encode(cart_id, &items)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    ks.set(cart_key, &document, Some(Duration::from_millis(ttl_ms)))?;
    Ok(ScriptReply::Int(items.len() as i64))
}

fn script_error(reason: String) -> StoreError {
    StoreError::Script {
        name: MIGRATE_LEGACY_CART.name().to_string(),
        reason,
    }
}

/// Convert the legacy cart at `cart_key` in place. Returns the number of
/// items carried over.
pub fn migrate(ctx: &CartContext, cart_key: &str, cart_id: &str) -> CartResult<i64> {
    validate_cart_id(cart_id)?;
    let ttl = ctx.settings().cart_expires_in();
    let keys = [cart_key.to_string()];
    let args = [
        cart_id.to_string(),
        duration_ms(ttl).to_string(),
        legacy_item_pattern(cart_key),
    ];
    let reply = invoke_script(ctx.store(), &MIGRATE_LEGACY_CART, &keys, &args)?;
    let migrated = match reply {
        ScriptReply::Int(n) => n,
        other => return Err(script_error(format!("unexpected reply {other:?}")).into()),
    };
    info!(cart = cart_id, items = migrated, "legacy cart migrated");
    Ok(migrated)
}
