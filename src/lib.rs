// ============================================================================
// order_store - transactional order persistence
// ============================================================================
//
// - store:   OrderRepository trait, Postgres and in-memory implementations
// - domain:  order value objects, OrderService, OrderWorkflow
// - context: caller-owned cancellation and deadlines
// - config:  environment-driven store configuration
// - metrics: Prometheus counters and histograms for store operations
// - utils:   retry policy used when opening the store
//
// ============================================================================

pub mod config;
pub mod context;
pub mod domain;
pub mod metrics;
pub mod store;
pub mod utils;

pub use config::StoreConfig;
pub use context::CallContext;
pub use domain::order::{Order, OrderError, OrderService, OrderWorkflow, OrderedProduct, WorkflowError};
pub use store::{InMemoryOrderRepository, OrderRepository, PostgresOrderRepository, StoreError};
