use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Order Value Objects
// ============================================================================

/// An order header plus its line items.
///
/// `total_price` is fixed when the order is created and is never recomputed
/// from the line items on read.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub account_id: String,
    pub created_at: DateTime<Utc>,
    pub total_price: Decimal,
    pub products: Vec<OrderedProduct>,
}

impl Order {
    /// Sum of `price * quantity` over the line items, `None` if it does not
    /// fit in a `Decimal`.
    pub fn computed_total(&self) -> Option<Decimal> {
        self.products
            .iter()
            .try_fold(Decimal::ZERO, |total, product| total.checked_add(product.line_total()?))
    }

    pub fn item_count(&self) -> usize {
        self.products.len()
    }
}

/// One line item. Name, description and price are copies taken from the
/// catalog; only `id` and `quantity` are persisted.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderedProduct {
    #[serde(rename = "product_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub quantity: u32,
}

impl OrderedProduct {
    /// A line item as it comes back from the store: identifiers only.
    pub fn stored(id: impl Into<String>, quantity: u32) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            description: String::new(),
            price: Decimal::ZERO,
            quantity,
        }
    }

    /// `price * quantity`, `None` on overflow.
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price: Decimal, quantity: u32) -> OrderedProduct {
        OrderedProduct {
            id: id.to_string(),
            name: format!("{id} name"),
            description: format!("{id} description"),
            price,
            quantity,
        }
    }

    #[test]
    fn test_line_total() {
        let item = product("p1", Decimal::new(1050, 2), 3);
        assert_eq!(item.line_total(), Some(Decimal::new(3150, 2)));
    }

    #[test]
    fn test_line_total_overflow_is_none() {
        let item = product("p1", Decimal::MAX, 2);
        assert_eq!(item.line_total(), None);
    }

    #[test]
    fn test_computed_total_sums_all_lines() {
        let order = Order {
            id: Uuid::now_v7(),
            account_id: "acc1".to_string(),
            created_at: Utc::now(),
            total_price: Decimal::ZERO,
            products: vec![
                product("p1", Decimal::new(10, 0), 2),
                product("p2", Decimal::new(199, 2), 1),
            ],
        };

        assert_eq!(order.computed_total(), Some(Decimal::new(2199, 2)));
        assert_eq!(order.item_count(), 2);
    }

    #[test]
    fn test_computed_total_overflow_is_none() {
        let order = Order {
            id: Uuid::now_v7(),
            account_id: "acc1".to_string(),
            created_at: Utc::now(),
            total_price: Decimal::ZERO,
            products: vec![product("p1", Decimal::MAX, 1), product("p2", Decimal::MAX, 1)],
        };

        assert_eq!(order.computed_total(), None);
    }

    #[test]
    fn test_stored_product_has_empty_display_fields() {
        let item = OrderedProduct::stored("p9", 4);
        assert_eq!(item.id, "p9");
        assert_eq!(item.quantity, 4);
        assert!(item.name.is_empty());
        assert_eq!(item.price, Decimal::ZERO);
    }

    #[test]
    fn test_ordered_product_serializes_product_id() {
        let json = serde_json::to_value(product("p1", Decimal::new(5, 0), 1)).unwrap();
        assert_eq!(json["product_id"], "p1");
        assert_eq!(json["price"], "5");
    }
}
