// ============================================================================
// Order Store - persistence for orders and their line items
// ============================================================================
//
// - repository: the `OrderRepository` seam the service depends on
// - postgres:   transactional write (INSERT + COPY) and join-based read
// - memory:     in-process store with the same contract
// - grouping:   fold of sorted join rows back into nested orders
//
// ============================================================================

pub mod copy_text;
pub mod error;
pub mod grouping;
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod schema;

pub use error::{StoreError, StorePhase};
pub use grouping::{group_rows, group_sorted_rows, OrderRow};
pub use memory::InMemoryOrderRepository;
pub use postgres::PostgresOrderRepository;
pub use repository::OrderRepository;
