//! Shopping carts persisted as single JSON documents in a key-value store.
//!
//! A [`Cart`] is bound to one store key, `{prefix}:{id}`, and loads its items
//! lazily on first use. Carts written by older deployments as a set of item
//! references plus one hash per item are converted in place, atomically, the
//! first time they are read.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use cartkv_core::{CartContext, CartSettings};
//! use cartkv_store::InMemoryKvStore;
//!
//! let ctx = CartContext::new(CartSettings::default(), Arc::new(InMemoryKvStore::new())).unwrap();
//! let mut cart = ctx.cart("42");
//! cart.add_item("1", "Book", [("unit_cost", "9.99"), ("quantity", "2")]).unwrap();
//! cart.save().unwrap();
//! assert_eq!(cart.total().unwrap(), 19.98);
//! ```

pub mod cart;
pub mod config;
pub mod error;
pub mod item;
pub mod keys;
pub mod legacy;
pub mod migration;
pub mod money;

pub use cart::Cart;
pub use config::{CartContext, CartSettings};
pub use error::{CartError, CartResult};
pub use item::{CartEntity, Item, ItemHandle, ItemMut, ModelResolver};
pub use legacy::write_legacy_cart;
pub use migration::{migrate, MIGRATE_LEGACY_CART};

// Re-export the types callers handle directly.
pub use cartkv_store::{KvStore, Ttl};
pub use cartkv_types::{CartDocument, FieldValue, ItemIndex, Record};
