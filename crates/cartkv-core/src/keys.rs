//! Store key layout.
//!
//! - `{prefix}:{cart_id}` -- the cart document (legacy: the set of item suffixes)
//! - `{prefix}:{cart_id}:{suffix}` -- one legacy line-item hash

use cartkv_store::pattern;

use crate::error::{CartError, CartResult};

/// Cart ids must not contain `:`, or one cart's key would sit under another
/// cart's nested-key pattern.
pub fn validate_cart_id(cart_id: &str) -> CartResult<()> {
    if cart_id.contains(':') {
        return Err(CartError::InvalidCartId(cart_id.to_string()));
    }
    Ok(())
}

pub fn cart_key(prefix: &str, cart_id: &str) -> String {
    format!("{prefix}:{cart_id}")
}

pub fn legacy_item_key(cart_key: &str, suffix: &str) -> String {
    format!("{cart_key}:{suffix}")
}

/// Glob matching every key nested under a cart key.
pub fn legacy_item_pattern(cart_key: &str) -> String {
    format!("{}:*", pattern::escape(cart_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartkv_store::pattern::glob_match;

    #[test]
    fn layout() {
        let key = cart_key("cart", "42");
        assert_eq!(key, "cart:42");
        assert_eq!(legacy_item_key(&key, "Book:1"), "cart:42:Book:1");
    }

    #[test]
    fn pattern_covers_nested_keys_only() {
        let pattern = legacy_item_pattern("cart:42");
        assert!(glob_match(&pattern, "cart:42:Book:1"));
        assert!(!glob_match(&pattern, "cart:42"));
        assert!(!glob_match(&pattern, "cart:420:Book:1"));
    }

    #[test]
    fn cart_ids_may_not_contain_separator() {
        assert!(validate_cart_id("42").is_ok());
        assert!(validate_cart_id("user-7@example.com").is_ok());
        assert!(matches!(
            validate_cart_id("42:gift"),
            Err(CartError::InvalidCartId(id)) if id == "42:gift"
        ));
    }

    #[test]
    fn cart_ids_with_glob_characters_are_escaped() {
        let pattern = legacy_item_pattern(&cart_key("cart", "a*"));
        assert!(glob_match(&pattern, "cart:a*:Book:1"));
        assert!(!glob_match(&pattern, "cart:abc:Book:1"));
    }
}
