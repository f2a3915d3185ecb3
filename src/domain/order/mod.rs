// ============================================================================
// Order Domain
// ============================================================================
//
// - Value objects (Order, OrderedProduct)
// - Commands (PlaceOrder, ProductRequest)
// - Errors (OrderError, WorkflowError)
// - Service (OrderService: derived fields + persistence)
// - Ports (AccountDirectory, ProductCatalog)
// - Workflow (OrderWorkflow: account/catalog checks around the service)
//
// Persistence lives in crate::store; this module only sees the
// OrderRepository trait.
//
// ============================================================================

pub mod value_objects;
pub mod commands;
pub mod errors;
pub mod ports;
pub mod service;
pub mod workflow;

// Re-export for convenience
pub use value_objects::*;
pub use commands::*;
pub use errors::*;
pub use ports::*;
pub use service::*;
pub use workflow::*;
