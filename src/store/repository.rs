use async_trait::async_trait;

use crate::context::CallContext;
use crate::domain::order::Order;

use super::error::StoreError;

// ============================================================================
// Order Repository - storage seam
// ============================================================================
//
// The order service depends on this trait only. Each backing store provides
// one implementation: `PostgresOrderRepository` for production and
// `InMemoryOrderRepository` for tests and local runs.
//
// ============================================================================

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist the header and every line item as one all-or-nothing unit.
    async fn put_order(&self, ctx: &CallContext, order: &Order) -> Result<(), StoreError>;

    /// Every order of `account_id`, ascending by order id, each with its line
    /// items. An unknown account yields an empty list.
    async fn get_orders_for_account(
        &self,
        ctx: &CallContext,
        account_id: &str,
    ) -> Result<Vec<Order>, StoreError>;
}

/// Checks a write is storable before any transaction is opened.
pub(crate) fn validate_for_write(order: &Order) -> Result<(), StoreError> {
    if order.products.is_empty() {
        return Err(StoreError::EmptyOrder(order.id));
    }

    if let Some(item) = order
        .products
        .iter()
        .find(|item| item.quantity == 0 || item.quantity > i32::MAX as u32)
    {
        return Err(StoreError::InvalidQuantity {
            order_id: order.id,
            product_id: item.id.clone(),
            quantity: item.quantity,
        });
    }

    Ok(())
}
