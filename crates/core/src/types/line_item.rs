//! Gateway-facing cart line types.
//!
//! These only exist at the gateway boundary. The cart store keeps product
//! ids, not line-items.

use serde::{Deserialize, Serialize};

use crate::{ProductId, Quantity};

/// A `(product, quantity)` pair sent when adding to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

impl CartLineItem {
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: Quantity) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// A line as the remote cart service lists it.
///
/// Only the product id is read. Quantity and any other fields the service
/// returns are ignored, so a listing is never rejected over values this
/// side would not accept on add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedLine {
    pub product_id: ProductId,
}

impl From<ProductId> for ListedLine {
    fn from(product_id: ProductId) -> Self {
        Self { product_id }
    }
}

impl From<CartLineItem> for ListedLine {
    fn from(item: CartLineItem) -> Self {
        Self::from(item.product_id)
    }
}

/// Identifies a cart line for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineRef {
    pub product_id: ProductId,
}

impl From<ProductId> for CartLineRef {
    fn from(product_id: ProductId) -> Self {
        Self { product_id }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_item_wire_shape() {
        let item = CartLineItem::new(ProductId::new(7), Quantity::new(2).unwrap());
        let body = serde_json::to_value(item).unwrap();
        assert_eq!(body, serde_json::json!({ "product_id": 7, "quantity": 2 }));
    }

    #[test]
    fn test_listed_line_ignores_quantity_and_extra_fields() {
        for json in [
            r#"{"product_id": 7, "quantity": 2, "title": "Phone", "price": 199.0}"#,
            r#"{"product_id": 7, "quantity": 0}"#,
            r#"{"product_id": 7, "quantity": 1000}"#,
            r#"{"product_id": 7, "quantity": -3}"#,
            r#"{"product_id": 7}"#,
        ] {
            let line: ListedLine = serde_json::from_str(json).unwrap();
            assert_eq!(line.product_id, ProductId::new(7), "{json}");
        }
    }

    #[test]
    fn test_line_ref_wire_shape() {
        let body = serde_json::to_value(CartLineRef::from(ProductId::new(3))).unwrap();
        assert_eq!(body, serde_json::json!({ "product_id": 3 }));
    }
}
