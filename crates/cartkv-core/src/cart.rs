use cartkv_store::{StoreError, Ttl};
use cartkv_types::{CartDocument, FieldValue, ItemIndex, Record};
use tracing::{debug, info};

use crate::config::{CartContext, CartSettings};
use crate::error::CartResult;
use crate::item::{CartEntity, Item, ItemHandle, ItemMut};
use crate::keys::{cart_key, validate_cart_id};
use crate::migration;
use crate::money;

static EMPTY_INDEX: ItemIndex = ItemIndex::new();

/// A shopping cart persisted as one JSON document under `{prefix}:{id}`.
///
/// Nothing is read at construction. The first operation loads the document,
/// converting a legacy multi-key cart on the way if it finds one, and the
/// loaded index is kept until [`Cart::reload`] or [`Cart::destroy`].
/// Mutations stay in memory until [`Cart::save`], which overwrites the whole
/// document: concurrent writers to the same cart are last-write-wins.
pub struct Cart {
    ctx: CartContext,
    id: String,
    items: Option<ItemIndex>,
}

impl Cart {
    pub fn new(ctx: CartContext, id: impl Into<String>) -> Self {
        Self {
            ctx,
            id: id.into(),
            items: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The store key holding this cart.
    pub fn key(&self) -> String {
        cart_key(&self.ctx.settings().key_prefix, &self.id)
    }

    pub fn is_loaded(&self) -> bool {
        self.items.is_some()
    }

    pub fn settings(&self) -> &CartSettings {
        self.ctx.settings()
    }

    // ---- Lifecycle ----

    /// Load the cart unless it is already loaded. Fails with
    /// [`CartError::InvalidCartId`](crate::CartError::InvalidCartId) if the id
    /// contains `:`; every other operation loads first.
    pub fn load(&mut self) -> CartResult<()> {
        if self.items.is_none() {
            validate_cart_id(&self.id)?;
            self.items = Some(self.fetch()?);
        }
        Ok(())
    }

    /// Discard in-memory state and load again from the store.
    pub fn reload(&mut self) -> CartResult<()> {
        self.items = None;
        self.load()
    }

    /// Write the whole cart back as one document and refresh its expiry.
    pub fn save(&mut self) -> CartResult<()> {
        self.load()?;
        let key = self.key();
        let items = self.items.as_ref().unwrap_or(&EMPTY_INDEX);
        let document = CartDocument::encode(&self.id, items)?;
        self.ctx
            .store()
            .set(&key, &document, Some(self.ctx.settings().cart_expires_in()))?;
        debug!(cart = %self.id, items = items.len(), bytes = document.len(), "cart saved");
        Ok(())
    }

    fn fetch(&self) -> CartResult<ItemIndex> {
        let key = self.key();
        let store = self.ctx.store();
        let raw = match store.get(&key) {
            Err(StoreError::WrongType { found, .. }) => {
                info!(cart = %self.id, found, "cart stored in legacy layout");
                migration::migrate(&self.ctx, &key, &self.id)?;
                store.get(&key)?
            }
            other => other?,
        };
        let items = match raw {
            Some(json) => CartDocument::from_json(&json)?.items,
            None => ItemIndex::new(),
        };
        debug!(cart = %self.id, items = items.len(), "cart loaded");
        Ok(items)
    }

    fn index(&mut self) -> CartResult<&ItemIndex> {
        self.load()?;
        Ok(self.items.as_ref().unwrap_or(&EMPTY_INDEX))
    }

    fn index_mut(&mut self) -> CartResult<&mut ItemIndex> {
        self.load()?;
        Ok(self.items.get_or_insert_with(ItemIndex::new))
    }

    /// Load, then split into the pieces an [`Item`] view borrows.
    fn views(&mut self) -> CartResult<(&CartSettings, &ItemIndex)> {
        self.load()?;
        Ok((
            self.ctx.settings(),
            self.items.as_ref().unwrap_or(&EMPTY_INDEX),
        ))
    }

    // ---- Mutation ----

    /// Insert or replace the item `{id, type, ...fields}`. Not persisted
    /// until [`Cart::save`].
    pub fn add_item<I, K, V>(
        &mut self,
        id: impl Into<String>,
        item_type: impl Into<String>,
        fields: I,
    ) -> CartResult<ItemHandle>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let record = Record::new(id, item_type, fields);
        let handle = ItemHandle::new(record.item_type(), record.id());
        debug!(cart = %self.id, item = %record.key().short_hex(), "item added");
        self.index_mut()?.insert(record);
        Ok(handle)
    }

    /// Remove an item from the in-memory index. Returns `true` if it was
    /// present. Not persisted until [`Cart::save`].
    pub fn remove_item(&mut self, item: &impl CartEntity) -> CartResult<bool> {
        let id = item.entity_id();
        let removed = self.index_mut()?.remove(item.type_name(), &id);
        Ok(removed.is_some())
    }

    /// Remove an item and save the cart immediately.
    pub fn destroy_item(&mut self, item: &impl CartEntity) -> CartResult<bool> {
        let removed = self.remove_item(item)?;
        self.save()?;
        Ok(removed)
    }

    /// Mutable view of an item, for dynamic field updates.
    pub fn item_mut(&mut self, item: &impl CartEntity) -> CartResult<Option<ItemMut<'_>>> {
        let id = item.entity_id();
        let index = self.index_mut()?;
        Ok(index.get_mut(item.type_name(), &id).map(ItemMut::new))
    }

    // ---- Queries ----

    /// Items ordered by type then id, optionally restricted to one type.
    pub fn items(&mut self, item_type: Option<&str>) -> CartResult<Vec<Item<'_>>> {
        let (settings, index) = self.views()?;
        let items = match item_type {
            Some(item_type) => index
                .iter_type(item_type)
                .map(|record| Item::new(record, settings))
                .collect(),
            None => index
                .iter()
                .map(|record| Item::new(record, settings))
                .collect(),
        };
        Ok(items)
    }

    pub fn contains(&mut self, object: &impl CartEntity) -> CartResult<bool> {
        let id = object.entity_id();
        Ok(self.index()?.contains(object.type_name(), &id))
    }

    pub fn find(&mut self, object: &impl CartEntity) -> CartResult<Option<Item<'_>>> {
        let id = object.entity_id();
        let (settings, index) = self.views()?;
        Ok(index
            .get(object.type_name(), &id)
            .map(|record| Item::new(record, settings)))
    }

    /// Number of distinct items.
    pub fn count(&mut self) -> CartResult<usize> {
        Ok(self.index()?.len())
    }

    /// Sum of every item's quantity field.
    pub fn quantity(&mut self) -> CartResult<i64> {
        let field = self.ctx.settings().quantity_field.clone();
        Ok(self
            .index()?
            .iter()
            .map(|record| money::quantity(record.lookup(&field)))
            .sum())
    }

    /// Sum of item costs in whole cents.
    pub fn total_cents(&mut self) -> CartResult<i64> {
        Ok(self
            .items(None)?
            .iter()
            .fold(0i64, |total, item| total.saturating_add(item.cost_cents())))
    }

    /// Sum of item costs, exact to the cent.
    pub fn total(&mut self) -> CartResult<f64> {
        Ok(money::cents_to_amount(self.total_cents()?))
    }

    /// A copy of the cart as it would be saved.
    pub fn document(&mut self) -> CartResult<CartDocument> {
        let items = self.index()?.clone();
        Ok(CartDocument::new(self.id.clone(), items))
    }

    /// Consume the cart, yielding its loaded content.
    pub fn into_document(mut self) -> CartResult<CartDocument> {
        self.load()?;
        Ok(CartDocument::new(self.id, self.items.unwrap_or_default()))
    }

    // ---- Key management ----

    /// Remaining time-to-live of the cart key.
    pub fn ttl(&mut self) -> CartResult<Ttl> {
        self.load()?;
        Ok(self.ctx.store().ttl(&self.key())?)
    }

    /// Reset the expiry to the configured duration. Returns `false` if the
    /// cart has never been saved.
    pub fn touch(&mut self) -> CartResult<bool> {
        self.load()?;
        let ttl = self.ctx.settings().cart_expires_in();
        Ok(self.ctx.store().expire(&self.key(), ttl)?)
    }

    /// Delete the cart from the store. The handle stays usable and reads as
    /// empty afterwards.
    pub fn destroy(&mut self) -> CartResult<bool> {
        self.load()?;
        let existed = self.ctx.store().del(&self.key())?;
        self.items = None;
        info!(cart = %self.id, existed, "cart destroyed");
        Ok(existed)
    }

    /// Move the cart to a new id, keeping its content and expiry.
    ///
    /// The stored document still names the old id until the next save.
    pub fn reassign(&mut self, new_id: impl Into<String>) -> CartResult<()> {
        self.load()?;
        let new_id = new_id.into();
        validate_cart_id(&new_id)?;
        let from = self.key();
        let to = cart_key(&self.ctx.settings().key_prefix, &new_id);
        match self.ctx.store().rename(&from, &to) {
            Ok(()) | Err(StoreError::NoSuchKey(_)) => {}
            Err(e) => return Err(e.into()),
        }
        debug!(from = %self.id, to = %new_id, "cart reassigned");
        self.id = new_id;
        Ok(())
    }
}

impl std::fmt::Debug for Cart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cart")
            .field("id", &self.id)
            .field("loaded", &self.is_loaded())
            .field("items", &self.items.as_ref().map(ItemIndex::len))
            .finish()
    }
}
