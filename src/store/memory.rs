use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::context::CallContext;
use crate::domain::order::Order;

use super::error::StoreError;
use super::grouping::{group_sorted_rows, OrderRow};
use super::repository::{validate_for_write, OrderRepository};

// ============================================================================
// In-Memory Order Repository
// ============================================================================
//
// Same contract as the Postgres store, same table shapes: a header map
// keyed by order id plus a line-item map keyed by (order_id, product_id).
// Writes are staged and only become visible when the whole order is applied
// under the write lock. Reads rebuild the sorted join and run it through the
// same grouping fold.
//
// ============================================================================

#[derive(Debug, Clone)]
struct HeaderRow {
    created_at: chrono::DateTime<chrono::Utc>,
    account_id: String,
    total_price: rust_decimal::Decimal,
}

#[derive(Debug, Default)]
struct Tables {
    orders: BTreeMap<Uuid, HeaderRow>,
    order_products: BTreeMap<(Uuid, String), u32>,
}

#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    tables: RwLock<Tables>,
    fail_on_product: Option<String>,
    write_delay: Option<Duration>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the bulk load when this product id is appended.
    pub fn failing_on_product(mut self, product_id: impl Into<String>) -> Self {
        self.fail_on_product = Some(product_id.into());
        self
    }

    /// Hold every write open for `delay` before it is applied.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    pub async fn line_item_count(&self) -> usize {
        self.tables.read().await.order_products.len()
    }

    async fn write_order(&self, order: &Order) -> Result<(), StoreError> {
        let order_id = order.id;

        let header = HeaderRow {
            created_at: order.created_at,
            account_id: order.account_id.clone(),
            total_price: order.total_price,
        };

        let mut staged: Vec<((Uuid, String), u32)> = Vec::with_capacity(order.products.len());
        for product in &order.products {
            if self.fail_on_product.as_deref() == Some(product.id.as_str()) {
                return Err(StoreError::BulkLoadAppend {
                    order_id,
                    product_id: product.id.clone(),
                    source: sqlx::Error::Protocol(format!("injected failure for {}", product.id)),
                });
            }
            let key = (order_id, product.id.clone());
            if staged.iter().any(|(staged_key, _)| *staged_key == key) {
                return Err(StoreError::BulkLoadFlush {
                    order_id,
                    source: sqlx::Error::Protocol(format!(
                        "duplicate key (order_id, product_id)=({order_id}, {})",
                        product.id
                    )),
                });
            }
            staged.push((key, product.quantity));
        }

        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }

        let mut tables = self.tables.write().await;
        if tables.orders.contains_key(&order_id) {
            return Err(StoreError::InsertHeader {
                order_id,
                source: sqlx::Error::Protocol(format!("duplicate key (id)=({order_id})")),
            });
        }
        tables.orders.insert(order_id, header);
        tables.order_products.extend(staged);

        Ok(())
    }

    async fn read_orders(&self, account_id: &str) -> Vec<Order> {
        let tables = self.tables.read().await;

        let rows = tables
            .orders
            .iter()
            .filter(|(_, header)| header.account_id == account_id)
            .flat_map(|(order_id, header)| {
                tables
                    .order_products
                    .range((*order_id, String::new())..)
                    .take_while(move |((item_order, _), _)| item_order == order_id)
                    .map(move |((_, product_id), quantity)| OrderRow {
                        id: *order_id,
                        created_at: header.created_at,
                        account_id: header.account_id.clone(),
                        total_price: header.total_price,
                        product_id: product_id.clone(),
                        quantity: *quantity,
                    })
            })
            .collect::<Vec<_>>();

        group_sorted_rows(rows)
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn put_order(&self, ctx: &CallContext, order: &Order) -> Result<(), StoreError> {
        validate_for_write(order)?;
        ctx.run(self.write_order(order)).await?;

        tracing::debug!(
            order_id = %order.id,
            item_count = order.products.len(),
            "Order stored in memory"
        );
        Ok(())
    }

    async fn get_orders_for_account(
        &self,
        ctx: &CallContext,
        account_id: &str,
    ) -> Result<Vec<Order>, StoreError> {
        ctx.run(async { Ok(self.read_orders(account_id).await) }).await
    }
}
