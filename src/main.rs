use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use order_store::metrics::StoreMetrics;
use order_store::{CallContext, OrderService, OrderedProduct, PostgresOrderRepository, StoreConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_store=debug"))
        )
        .init();

    tracing::info!("🚀 Starting order store demo");

    // === 1. Load configuration ===
    let config = StoreConfig::from_env()?;
    tracing::info!(config = ?config, "Loaded store configuration");

    // === 2. Connect (retrying per the configured policy) ===
    let metrics = Arc::new(StoreMetrics::new()?);
    let repository = PostgresOrderRepository::connect_with_metrics(&config, Some(metrics.clone())).await?;
    repository.ensure_schema().await?;
    let repository = Arc::new(repository);

    // === 3. Build the service on top of the repository trait ===
    let service = OrderService::new(repository.clone());

    // === 4. Place an order and read it back ===
    let account_id = std::env::args().nth(1).unwrap_or_else(|| "demo-account".to_string());
    let ctx = CallContext::with_timeout(Duration::from_secs(10));

    let order = service
        .post_order(
            &ctx,
            &account_id,
            vec![
                OrderedProduct {
                    id: "demo-keyboard".to_string(),
                    name: "Keyboard".to_string(),
                    description: "Mechanical keyboard".to_string(),
                    price: Decimal::new(8999, 2),
                    quantity: 1,
                },
                OrderedProduct {
                    id: "demo-cable".to_string(),
                    name: "USB-C cable".to_string(),
                    description: "1m braided cable".to_string(),
                    price: Decimal::new(1250, 2),
                    quantity: 2,
                },
            ],
        )
        .await?;

    tracing::info!(order_id = %order.id, total_price = %order.total_price, "✅ Order placed");

    let orders = service.get_orders_for_account(&ctx, &account_id).await?;
    for order in &orders {
        tracing::info!(
            order_id = %order.id,
            created_at = %order.created_at,
            total_price = %order.total_price,
            item_count = order.products.len(),
            "📦 Stored order"
        );
    }
    println!("{}", serde_json::to_string_pretty(&orders)?);

    tracing::debug!(metrics = %metrics.render()?, "Store metrics");

    repository.close().await;
    tracing::info!("🎉 Demo complete!");

    Ok(())
}
