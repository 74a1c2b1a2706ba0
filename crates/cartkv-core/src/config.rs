use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use cartkv_store::KvStore;
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::error::{CartError, CartResult};

/// Field names and expiry policy for carts.
///
/// Deserializable from TOML; every key is optional:
///
/// ```toml
/// unit_cost_field = "unit_cost"
/// quantity_field = "quantity"
/// cart_expires_in_secs = 2592000
/// key_prefix = "cart"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CartSettings {
    /// Record field holding the unit cost as a decimal.
    pub unit_cost_field: String,
    /// Record field holding the quantity as an integer.
    pub quantity_field: String,
    /// Lifetime of an idle cart.
    pub cart_expires_in_secs: u64,
    /// Namespace of cart keys: a cart with id `42` lives at `{prefix}:42`.
    pub key_prefix: String,
}

impl Default for CartSettings {
    fn default() -> Self {
        Self {
            unit_cost_field: "unit_cost".into(),
            quantity_field: "quantity".into(),
            cart_expires_in_secs: 30 * 24 * 60 * 60,
            key_prefix: "cart".into(),
        }
    }
}

impl CartSettings {
    pub fn cart_expires_in(&self) -> Duration {
        Duration::from_secs(self.cart_expires_in_secs)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(text: &str) -> CartResult<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a TOML file.
    pub fn load(path: &Path) -> CartResult<Self> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> CartResult<()> {
        if self.unit_cost_field.is_empty() || self.quantity_field.is_empty() {
            return Err(CartError::Config("field names must not be empty".into()));
        }
        if self.cart_expires_in_secs == 0 {
            return Err(CartError::Config("cart_expires_in_secs must be positive".into()));
        }
        if self.key_prefix.is_empty()
            || self
                .key_prefix
                .contains([':', '*', '?', '[', ']', '\\'])
        {
            return Err(CartError::Config(format!(
                "key_prefix {:?} must be non-empty and free of ':' and glob characters",
                self.key_prefix
            )));
        }
        Ok(())
    }
}

/// Everything a cart needs from its environment: settings and a store handle.
#[derive(Clone)]
pub struct CartContext {
    settings: Arc<CartSettings>,
    store: Arc<dyn KvStore>,
}

impl CartContext {
    pub fn new(settings: CartSettings, store: Arc<dyn KvStore>) -> CartResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings: Arc::new(settings),
            store,
        })
    }

    pub fn settings(&self) -> &CartSettings {
        &self.settings
    }

    pub fn store(&self) -> &dyn KvStore {
        self.store.as_ref()
    }

    /// A handle to the cart with this id. Nothing is read until first use.
    pub fn cart(&self, id: impl Into<String>) -> Cart {
        Cart::new(self.clone(), id)
    }
}

impl std::fmt::Debug for CartContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartContext")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
