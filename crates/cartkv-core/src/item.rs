use cartkv_types::{FieldValue, ItemKey, Record};

use crate::config::CartSettings;
use crate::error::CartResult;
use crate::money;

/// Anything that can be looked up in a cart by its type name and id.
pub trait CartEntity {
    /// The item type the entity is filed under.
    fn type_name(&self) -> &str;
    fn entity_id(&self) -> String;
}

/// Resolves an item's type and id to an application-level entity.
pub trait ModelResolver {
    type Model;
    type Error;

    fn resolve(&self, item_type: &str, id: &str) -> Result<Self::Model, Self::Error>;
}

/// Owned reference to an item by type and id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemHandle {
    pub item_type: String,
    pub id: String,
}

impl ItemHandle {
    pub fn new(item_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            id: id.into(),
        }
    }
}

impl CartEntity for ItemHandle {
    fn type_name(&self) -> &str {
        &self.item_type
    }

    fn entity_id(&self) -> String {
        self.id.clone()
    }
}

/// Read-only view of one record in a cart.
#[derive(Clone, Copy, Debug)]
pub struct Item<'a> {
    record: &'a Record,
    settings: &'a CartSettings,
}

impl<'a> Item<'a> {
    pub(crate) fn new(record: &'a Record, settings: &'a CartSettings) -> Self {
        Self { record, settings }
    }

    pub fn id(&self) -> &'a str {
        self.record.id()
    }

    pub fn item_type(&self) -> &'a str {
        self.record.item_type()
    }

    pub fn record(&self) -> &'a Record {
        self.record
    }

    /// Identity key for logs and deduplication.
    pub fn key(&self) -> ItemKey {
        self.record.key()
    }

    pub fn handle(&self) -> ItemHandle {
        ItemHandle::new(self.item_type(), self.id())
    }

    /// Read a declared field.
    pub fn get(&self, field: &str) -> CartResult<&'a FieldValue> {
        Ok(self.record.get(field)?)
    }

    pub fn unit_cost_cents(&self) -> i64 {
        money::unit_cost_cents(self.record.lookup(&self.settings.unit_cost_field))
    }

    pub fn quantity(&self) -> i64 {
        money::quantity(self.record.lookup(&self.settings.quantity_field))
    }

    /// Line cost in cents: whole-cent unit cost times quantity.
    pub fn cost_cents(&self) -> i64 {
        self.unit_cost_cents().saturating_mul(self.quantity())
    }

    pub fn cost(&self) -> f64 {
        money::cents_to_amount(self.cost_cents())
    }

    /// Resolve this item to its domain entity.
    pub fn model<R: ModelResolver>(&self, resolver: &R) -> Result<R::Model, R::Error> {
        resolver.resolve(self.item_type(), self.id())
    }
}

impl CartEntity for Item<'_> {
    fn type_name(&self) -> &str {
        self.item_type()
    }

    fn entity_id(&self) -> String {
        self.id().to_string()
    }
}

/// Mutable view of one record in a cart. Changes persist on the next save.
#[derive(Debug)]
pub struct ItemMut<'a> {
    record: &'a mut Record,
}

impl<'a> ItemMut<'a> {
    pub(crate) fn new(record: &'a mut Record) -> Self {
        Self { record }
    }

    pub fn get(&self, field: &str) -> CartResult<&FieldValue> {
        Ok(self.record.get(field)?)
    }

    /// Overwrite a declared field, returning the previous value.
    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) -> CartResult<FieldValue> {
        Ok(self.record.set(field, value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings() -> CartSettings {
        CartSettings::default()
    }

    #[test]
    fn widget_cost() {
        let s = settings();
        let record = Record::new(
            "7",
            "Widget",
            [
                ("unit_cost", FieldValue::from("2.50")),
                ("quantity", FieldValue::Int(3)),
            ],
        );
        let item = Item::new(&record, &s);
        assert_eq!(item.unit_cost_cents(), 250);
        assert_eq!(item.quantity(), 3);
        assert_eq!(item.cost_cents(), 750);
        assert_eq!(item.cost(), 7.50);
    }

    #[test]
    fn cost_uses_configured_fields() {
        let s = CartSettings {
            unit_cost_field: "price".into(),
            quantity_field: "qty".into(),
            ..CartSettings::default()
        };
        let record = Record::new(
            "1",
            "Book",
            [("price", "9.99"), ("qty", "2"), ("unit_cost", "100")],
        );
        assert_eq!(Item::new(&record, &s).cost_cents(), 1998);
    }

    #[test]
    fn missing_cost_fields_cost_nothing() {
        let s = settings();
        let record = Record::new("1", "Gift", Vec::<(String, FieldValue)>::new());
        let item = Item::new(&record, &s);
        assert_eq!(item.cost(), 0.0);
        assert_eq!(item.quantity(), 0);
    }

    #[test]
    fn dynamic_access_is_strict() {
        let s = settings();
        let mut record = Record::new("1", "Book", [("unit_cost", "9.99")]);
        let item = Item::new(&record, &s);
        assert_eq!(item.get("unit_cost").unwrap(), &FieldValue::from("9.99"));
        assert!(item.get("title").unwrap_err().is_unknown_field());

        let mut item = ItemMut::new(&mut record);
        assert!(item.set("title", "Dune").unwrap_err().is_unknown_field());
        item.set("unit_cost", "8.00").unwrap();
        assert_eq!(item.get("unit_cost").unwrap(), &FieldValue::from("8.00"));
    }

    #[test]
    fn key_and_handle() {
        let s = settings();
        let record = Record::new("5", "Pen", Vec::<(String, FieldValue)>::new());
        let item = Item::new(&record, &s);
        assert_eq!(item.key(), cartkv_types::item_key("Pen", "5"));
        assert_eq!(item.handle(), ItemHandle::new("Pen", "5"));
        assert_eq!(item.type_name(), "Pen");
        assert_eq!(item.entity_id(), "5");
    }

    struct Catalog(HashMap<(String, String), &'static str>);

    #[derive(Debug, PartialEq)]
    struct NotFound;

    impl ModelResolver for Catalog {
        type Model = &'static str;
        type Error = NotFound;

        fn resolve(&self, item_type: &str, id: &str) -> Result<&'static str, NotFound> {
            self.0
                .get(&(item_type.to_string(), id.to_string()))
                .copied()
                .ok_or(NotFound)
        }
    }

    #[test]
    fn model_delegates_to_resolver() {
        let s = settings();
        let catalog = Catalog(
            [(("Book".to_string(), "1".to_string()), "Dune")]
                .into_iter()
                .collect(),
        );
        let book = Record::new("1", "Book", Vec::<(String, FieldValue)>::new());
        let pen = Record::new("5", "Pen", Vec::<(String, FieldValue)>::new());
        assert_eq!(Item::new(&book, &s).model(&catalog), Ok("Dune"));
        assert_eq!(Item::new(&pen, &s).model(&catalog), Err(NotFound));
    }
}
