use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

// ============================================================================
// Metrics Module - Prometheus metrics for the order store
// ============================================================================
//
// Tracks:
// - Orders persisted and persist failures by failing phase
// - Account reads and the number of orders they returned
// - Latency of store operations
// - Connection attempts made while bootstrapping the pool
//
// The registry is owned here; exposing it is up to the hosting process.
// ============================================================================

pub struct StoreMetrics {
    registry: Registry,

    pub orders_persisted: IntCounter,
    pub order_persist_failures: IntCounterVec,
    pub order_line_items_persisted: IntCounter,

    pub order_reads: IntCounter,
    pub orders_returned: IntCounter,
    pub order_read_failures: IntCounterVec,

    pub operation_duration: HistogramVec,

    pub connect_attempts: IntCounter,
}

impl StoreMetrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_persisted = IntCounter::new(
            "orders_persisted_total",
            "Total orders committed to the store",
        )?;
        registry.register(Box::new(orders_persisted.clone()))?;

        let order_persist_failures = IntCounterVec::new(
            Opts::new("order_persist_failures_total", "Order writes rolled back, by failing phase"),
            &["phase"],
        )?;
        registry.register(Box::new(order_persist_failures.clone()))?;

        let order_line_items_persisted = IntCounter::new(
            "order_line_items_persisted_total",
            "Total line items bulk loaded with committed orders",
        )?;
        registry.register(Box::new(order_line_items_persisted.clone()))?;

        let order_reads = IntCounter::new(
            "order_reads_total",
            "Total successful per-account order reads",
        )?;
        registry.register(Box::new(order_reads.clone()))?;

        let orders_returned = IntCounter::new(
            "orders_returned_total",
            "Total orders returned by per-account reads",
        )?;
        registry.register(Box::new(orders_returned.clone()))?;

        let order_read_failures = IntCounterVec::new(
            Opts::new("order_read_failures_total", "Failed per-account order reads, by phase"),
            &["phase"],
        )?;
        registry.register(Box::new(order_read_failures.clone()))?;

        let operation_duration = HistogramVec::new(
            HistogramOpts::new("store_operation_duration_seconds", "Order store operation duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        let connect_attempts = IntCounter::new(
            "store_connect_attempts_total",
            "Connection attempts made while opening the order store",
        )?;
        registry.register(Box::new(connect_attempts.clone()))?;

        Ok(Self {
            registry,
            orders_persisted,
            order_persist_failures,
            order_line_items_persisted,
            order_reads,
            orders_returned,
            order_read_failures,
            operation_duration,
            connect_attempts,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_put(&self, item_count: usize, duration_secs: f64, failed_phase: Option<&str>) {
        match failed_phase {
            None => {
                self.orders_persisted.inc();
                self.order_line_items_persisted.inc_by(item_count as u64);
            }
            Some(phase) => {
                self.order_persist_failures.with_label_values(&[phase]).inc();
            }
        }
        self.operation_duration.with_label_values(&["put_order"]).observe(duration_secs);
    }

    pub fn record_read(&self, order_count: usize, duration_secs: f64, failed_phase: Option<&str>) {
        match failed_phase {
            None => {
                self.order_reads.inc();
                self.orders_returned.inc_by(order_count as u64);
            }
            Some(phase) => {
                self.order_read_failures.with_label_values(&[phase]).inc();
            }
        }
        self.operation_duration
            .with_label_values(&["get_orders_for_account"])
            .observe(duration_secs);
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
