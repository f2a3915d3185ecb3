use rust_decimal::Decimal;

use crate::store::StoreError;

// ============================================================================
// Order Errors
// ============================================================================

/// Errors from the order service. Store failures pass through untouched.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order items cannot be empty")]
    EmptyItems,

    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: String, quantity: u32 },

    #[error("Invalid price {price} for product {product_id}")]
    InvalidPrice { product_id: String, price: Decimal },

    #[error("Product {0} appears more than once in the order")]
    DuplicateProduct(String),

    #[error("Account id cannot be empty")]
    EmptyAccountId,

    #[error("Order total overflows at product {product_id}")]
    TotalOverflow { product_id: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from the order placement workflow.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("account not found: {account_id}")]
    AccountNotFound {
        account_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("products not found: catalog lookup failed")]
    CatalogUnavailable(#[source] anyhow::Error),

    #[error("unknown products requested: {}", .0.join(", "))]
    UnknownProducts(Vec<String>),

    #[error(transparent)]
    Order(#[from] OrderError),
}

impl From<StoreError> for WorkflowError {
    fn from(error: StoreError) -> Self {
        Self::Order(OrderError::Store(error))
    }
}
