// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Order-specific types and orchestration. Storage is reached only through
// the store::OrderRepository trait.
//
// ============================================================================

pub mod order;
