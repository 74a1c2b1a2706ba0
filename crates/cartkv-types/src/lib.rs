//! Foundation types for cartkv.
//!
//! This crate provides the value and structure types that make up a cart as
//! it is persisted. Every other cartkv crate depends on `cartkv-types`.
//!
//! # Key Types
//!
//! - [`FieldValue`] -- string, number, or null value of a line-item field
//! - [`Record`] -- one line item with a fixed set of declared fields
//! - [`ItemIndex`] -- `type -> id -> Record` index held by a cart
//! - [`CartDocument`] -- the consolidated JSON document stored per cart
//! - [`ContentHash`] / [`ItemKey`] -- domain-separated BLAKE3 hashes

pub mod error;
pub mod hash;
pub mod index;
pub mod record;
pub mod value;

pub use error::{TypeError, TypeResult};
pub use hash::{item_key, ContentHash, ContentHasher, ItemKey};
pub use index::{CartDocument, ItemIndex, TypeBucket};
pub use record::{Record, ID_FIELD, TYPE_FIELD};
pub use value::FieldValue;
