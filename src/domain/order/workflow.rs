use std::collections::HashMap;
use std::sync::Arc;

use crate::context::CallContext;

use super::commands::PlaceOrder;
use super::errors::WorkflowError;
use super::ports::{AccountDirectory, CatalogProduct, ProductCatalog};
use super::service::OrderService;
use super::value_objects::{Order, OrderedProduct};

// ============================================================================
// Order Workflow
// ============================================================================
//
// Orchestrates: account check → catalog lookup → OrderService → store
//
// Requested ids the catalog does not return are rejected, not dropped.
// Listing re-reads display fields (name, description, price) from the
// current catalog, since the store keeps only ids and quantities.
//
// ============================================================================

pub struct OrderWorkflow {
    orders: OrderService,
    accounts: Arc<dyn AccountDirectory>,
    catalog: Arc<dyn ProductCatalog>,
}

impl OrderWorkflow {
    pub fn new(
        orders: OrderService,
        accounts: Arc<dyn AccountDirectory>,
        catalog: Arc<dyn ProductCatalog>,
    ) -> Self {
        Self {
            orders,
            accounts,
            catalog,
        }
    }

    pub async fn place_order(&self, ctx: &CallContext, command: PlaceOrder) -> Result<Order, WorkflowError> {
        let account = self
            .accounts
            .get_account(&command.account_id)
            .await
            .map_err(|source| {
                tracing::warn!(account_id = %command.account_id, error = %source, "Error getting account");
                WorkflowError::AccountNotFound {
                    account_id: command.account_id.clone(),
                    source,
                }
            })?;

        let requested = command.merged_quantities();
        let ids: Vec<String> = requested.iter().map(|(id, _)| id.clone()).collect();

        let catalog = self.catalog_index(&ids).await.map_err(|source| {
            tracing::warn!(account_id = %account.id, error = %source, "Error getting products");
            WorkflowError::CatalogUnavailable(source)
        })?;

        let unknown: Vec<String> = ids
            .iter()
            .filter(|id| !catalog.contains_key(id.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            tracing::warn!(account_id = %account.id, unknown = ?unknown, "Rejecting order with unknown products");
            return Err(WorkflowError::UnknownProducts(unknown));
        }

        let products = requested
            .into_iter()
            .filter_map(|(id, quantity)| {
                catalog.get(id.as_str()).map(|entry| OrderedProduct {
                    id,
                    name: entry.name.clone(),
                    description: entry.description.clone(),
                    price: entry.price,
                    quantity,
                })
            })
            .collect();

        Ok(self.orders.post_order(ctx, &account.id, products).await?)
    }

    /// Orders of `account_id` with line items filled from the current catalog.
    ///
    /// If the catalog cannot be reached the orders are returned with the
    /// stored fields only.
    pub async fn orders_for_account(&self, ctx: &CallContext, account_id: &str) -> Result<Vec<Order>, WorkflowError> {
        let mut orders = self.orders.get_orders_for_account(ctx, account_id).await?;
        if orders.is_empty() {
            return Ok(orders);
        }

        let mut ids: Vec<String> = orders
            .iter()
            .flat_map(|order| order.products.iter().map(|p| p.id.clone()))
            .collect();
        ids.sort();
        ids.dedup();

        match self.catalog_index(&ids).await {
            Ok(catalog) => {
                for product in orders.iter_mut().flat_map(|order| order.products.iter_mut()) {
                    if let Some(entry) = catalog.get(product.id.as_str()) {
                        product.name = entry.name.clone();
                        product.description = entry.description.clone();
                        product.price = entry.price;
                    }
                }
            }
            Err(error) => {
                tracing::warn!(
                    account_id = %account_id,
                    error = %error,
                    "Catalog unavailable, returning orders without product details"
                );
            }
        }

        Ok(orders)
    }

    async fn catalog_index(&self, ids: &[String]) -> anyhow::Result<HashMap<String, CatalogProduct>> {
        let products = self.catalog.get_products(ids).await?;
        Ok(products.into_iter().map(|p| (p.id.clone(), p)).collect())
    }
}
