use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::{Connection, Postgres, Transaction};

use crate::config::StoreConfig;
use crate::context::CallContext;
use crate::domain::order::Order;
use crate::metrics::StoreMetrics;
use crate::utils::retry_on_transient;

use super::copy_text::{line_item_row, LINE_ITEM_COPY};
use super::error::StoreError;
use super::grouping::{group_rows, OrderRow};
use super::repository::{validate_for_write, OrderRepository};
use super::schema;

// ============================================================================
// Postgres Order Repository
// ============================================================================
//
// Write path: one transaction per order.
//   1. INSERT the order header
//   2. COPY every line item into order_products (one text row per item)
//   3. COMMIT, or ROLLBACK on the first failure
//
// Read path: a single JOIN sorted by order id, streamed straight into the
// grouping fold.
//
// Each await on a connection is raced against the caller's context. An
// interrupted call detaches its connection from the pool and drops it, so no
// half-finished protocol exchange is ever handed to the next caller.
//
// ============================================================================

pub struct PostgresOrderRepository {
    pool: PgPool,
    metrics: Option<Arc<StoreMetrics>>,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, metrics: None }
    }

    pub fn with_metrics(mut self, metrics: Arc<StoreMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Open the pool, retrying connectivity failures per `config.connect_retry`.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        Self::connect_with_metrics(config, None).await
    }

    pub async fn connect_with_metrics(
        config: &StoreConfig,
        metrics: Option<Arc<StoreMetrics>>,
    ) -> Result<Self, StoreError> {
        tracing::info!(
            max_connections = config.max_connections,
            max_attempts = ?config.connect_retry.max_attempts,
            "Connecting to order store..."
        );

        let pool = retry_on_transient(&config.connect_retry, |attempt| {
            if let Some(metrics) = &metrics {
                metrics.connect_attempts.inc();
            }
            let options = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(config.acquire_timeout);
            let url = config.database_url.clone();
            async move {
                tracing::debug!(attempt = attempt, "Opening order store connection pool");
                options.connect(&url).await.map_err(StoreError::Connect)
            }
        })
        .await
        .into_result()?;

        tracing::info!("✅ Connected to order store");

        Ok(Self { pool, metrics })
    }

    /// Create the order tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in schema::ALL {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(StoreError::Schema)?;
        }
        tracing::debug!("Order schema ready");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Order store connection pool closed");
    }

    async fn write_order(&self, ctx: &CallContext, order: &Order) -> Result<(), StoreError> {
        let order_id = order.id;

        let mut conn = ctx
            .race(self.pool.acquire())
            .await?
            .map_err(|source| StoreError::Begin { order_id, source })?;

        let result = Self::write_on(&mut conn, ctx, order).await;
        if result.as_ref().is_err_and(|error| error.is_cancellation()) {
            tracing::warn!(order_id = %order_id, "Order write interrupted, discarding its connection");
            discard(conn);
        }
        result
    }

    async fn write_on(conn: &mut PgConnection, ctx: &CallContext, order: &Order) -> Result<(), StoreError> {
        let order_id = order.id;

        let mut tx = ctx
            .race(conn.begin())
            .await?
            .map_err(|source| StoreError::Begin { order_id, source })?;

        match Self::insert_order(&mut tx, ctx, order).await {
            // COMMIT is not raced: once it is sent the caller gets the real outcome.
            Ok(()) => tx
                .commit()
                .await
                .map_err(|source| StoreError::Commit { order_id, source }),
            // The connection is closed by the caller; the server rolls back.
            Err(error) if error.is_cancellation() => Err(error),
            Err(error) => {
                if let Err(rollback_error) = tx.rollback().await {
                    tracing::warn!(
                        order_id = %order_id,
                        error = %rollback_error,
                        "Rollback failed, connection will discard the transaction"
                    );
                }
                Err(error)
            }
        }
    }

    async fn insert_order(
        tx: &mut Transaction<'_, Postgres>,
        ctx: &CallContext,
        order: &Order,
    ) -> Result<(), StoreError> {
        let order_id = order.id;

        let insert = sqlx::query(schema::INSERT_ORDER)
            .bind(order.id)
            .bind(order.created_at)
            .bind(&order.account_id)
            .bind(order.total_price)
            .execute(&mut **tx);
        ctx.race(insert)
            .await?
            .map_err(|source| StoreError::InsertHeader { order_id, source })?;

        let mut copy = ctx
            .race(tx.copy_in_raw(LINE_ITEM_COPY))
            .await?
            .map_err(|source| StoreError::BulkLoadPrepare { order_id, source })?;

        for product in &order.products {
            // A send failure drops `copy`, which aborts the COPY on the connection.
            ctx.race(copy.send(line_item_row(order_id, product).into_bytes()))
                .await?
                .map_err(|source| StoreError::BulkLoadAppend {
                    order_id,
                    product_id: product.id.clone(),
                    source,
                })?;
        }

        let loaded = ctx
            .race(copy.finish())
            .await?
            .map_err(|source| StoreError::BulkLoadFlush { order_id, source })?;

        tracing::debug!(order_id = %order_id, rows = loaded, "Bulk loaded order line items");
        Ok(())
    }

    async fn read_orders(&self, ctx: &CallContext, account_id: &str) -> Result<Vec<Order>, StoreError> {
        let mut conn = ctx
            .race(self.pool.acquire())
            .await?
            .map_err(|source| StoreError::from_read_error(account_id, source))?;

        let rows = sqlx::query_as::<_, OrderRow>(schema::SELECT_ORDERS_FOR_ACCOUNT)
            .bind(account_id)
            .fetch(&mut *conn)
            .map_err(|source| StoreError::from_read_error(account_id, source));

        let grouped = ctx.race(group_rows(rows)).await;
        match grouped {
            Ok(result) => result,
            Err(interrupted) => {
                tracing::warn!(account_id = %account_id, "Order read interrupted, discarding its connection");
                discard(conn);
                Err(interrupted)
            }
        }
    }
}

/// Drop a connection an abandoned await may have left mid-protocol instead
/// of returning it to the pool. Closing the socket makes the server roll back
/// whatever transaction was open on it.
fn discard(conn: PoolConnection<Postgres>) {
    drop(conn.detach());
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn put_order(&self, ctx: &CallContext, order: &Order) -> Result<(), StoreError> {
        validate_for_write(order)?;

        let started = Instant::now();
        let result = self.write_order(ctx, order).await;
        let elapsed = started.elapsed().as_secs_f64();

        if let Some(metrics) = &self.metrics {
            let phase = result.as_ref().err().map(|e| e.phase().as_str());
            metrics.record_put(order.products.len(), elapsed, phase);
        }

        match &result {
            Ok(()) => tracing::info!(
                order_id = %order.id,
                account_id = %order.account_id,
                item_count = order.products.len(),
                "✅ Order persisted"
            ),
            Err(error) => tracing::error!(
                order_id = %order.id,
                account_id = %order.account_id,
                phase = error.phase().as_str(),
                error = %error,
                "Order write rolled back"
            ),
        }

        result
    }

    async fn get_orders_for_account(
        &self,
        ctx: &CallContext,
        account_id: &str,
    ) -> Result<Vec<Order>, StoreError> {
        let started = Instant::now();
        let result = self.read_orders(ctx, account_id).await;
        let elapsed = started.elapsed().as_secs_f64();

        if let Some(metrics) = &self.metrics {
            match &result {
                Ok(orders) => metrics.record_read(orders.len(), elapsed, None),
                Err(error) => metrics.record_read(0, elapsed, Some(error.phase().as_str())),
            }
        }

        match &result {
            Ok(orders) => tracing::debug!(
                account_id = %account_id,
                order_count = orders.len(),
                "Loaded orders for account"
            ),
            Err(error) => tracing::error!(
                account_id = %account_id,
                error = %error,
                "Failed to load orders for account"
            ),
        }

        result
    }
}
