use std::collections::HashSet;
use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::context::CallContext;
use crate::store::OrderRepository;

use super::errors::OrderError;
use super::value_objects::{Order, OrderedProduct};

// ============================================================================
// Order Service
// ============================================================================
//
// Fills in the derived fields of a new order (id, timestamp, total) and hands
// it to the repository. Reads go straight through.
//
// ============================================================================

#[derive(Clone)]
pub struct OrderService {
    repository: Arc<dyn OrderRepository>,
}

impl OrderService {
    pub fn new(repository: Arc<dyn OrderRepository>) -> Self {
        Self { repository }
    }

    /// Create and persist a new order for `account_id`.
    ///
    /// `products` must already carry catalog name, description and price.
    pub async fn post_order(
        &self,
        ctx: &CallContext,
        account_id: &str,
        products: Vec<OrderedProduct>,
    ) -> Result<Order, OrderError> {
        validate(account_id, &products)?;

        let mut order = Order {
            // v7 ids sort by creation time
            id: Uuid::now_v7(),
            account_id: account_id.to_string(),
            created_at: Utc::now().trunc_subsecs(6),
            total_price: Decimal::ZERO,
            products: Vec::with_capacity(products.len()),
        };

        for product in products {
            order.total_price = product
                .line_total()
                .and_then(|line| order.total_price.checked_add(line))
                .ok_or_else(|| OrderError::TotalOverflow {
                    product_id: product.id.clone(),
                })?;
            order.products.push(product);
        }

        tracing::info!(
            order_id = %order.id,
            account_id = %order.account_id,
            item_count = order.products.len(),
            total_price = %order.total_price,
            "Creating new order"
        );

        self.repository.put_order(ctx, &order).await?;

        Ok(order)
    }

    pub async fn get_orders_for_account(
        &self,
        ctx: &CallContext,
        account_id: &str,
    ) -> Result<Vec<Order>, OrderError> {
        Ok(self.repository.get_orders_for_account(ctx, account_id).await?)
    }
}

fn validate(account_id: &str, products: &[OrderedProduct]) -> Result<(), OrderError> {
    if account_id.trim().is_empty() {
        return Err(OrderError::EmptyAccountId);
    }

    if products.is_empty() {
        return Err(OrderError::EmptyItems);
    }

    let mut seen = HashSet::with_capacity(products.len());
    for product in products {
        if product.quantity == 0 || product.quantity > i32::MAX as u32 {
            return Err(OrderError::InvalidQuantity {
                product_id: product.id.clone(),
                quantity: product.quantity,
            });
        }
        if product.price.is_sign_negative() {
            return Err(OrderError::InvalidPrice {
                product_id: product.id.clone(),
                price: product.price,
            });
        }
        if !seen.insert(product.id.as_str()) {
            return Err(OrderError::DuplicateProduct(product.id.clone()));
        }
    }

    Ok(())
}
