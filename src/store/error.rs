use uuid::Uuid;

use crate::utils::IsTransient;

// ============================================================================
// Store Errors
// ============================================================================
//
// Every variant names the phase that failed. The store never retries; it
// returns the first error it hits and leaves the policy to the caller.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to connect to order store: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("failed to prepare order schema: {0}")]
    Schema(#[source] sqlx::Error),

    #[error("order {0} has no line items")]
    EmptyOrder(Uuid),

    #[error("order {order_id}: line item {product_id} has invalid quantity {quantity}")]
    InvalidQuantity {
        order_id: Uuid,
        product_id: String,
        quantity: u32,
    },

    #[error("order {order_id}: failed to begin transaction: {source}")]
    Begin {
        order_id: Uuid,
        #[source]
        source: sqlx::Error,
    },

    #[error("order {order_id}: failed to insert order header: {source}")]
    InsertHeader {
        order_id: Uuid,
        #[source]
        source: sqlx::Error,
    },

    #[error("order {order_id}: failed to prepare line item bulk load: {source}")]
    BulkLoadPrepare {
        order_id: Uuid,
        #[source]
        source: sqlx::Error,
    },

    #[error("order {order_id}: failed to append line item {product_id}: {source}")]
    BulkLoadAppend {
        order_id: Uuid,
        product_id: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("order {order_id}: failed to finalize line item bulk load: {source}")]
    BulkLoadFlush {
        order_id: Uuid,
        #[source]
        source: sqlx::Error,
    },

    #[error("order {order_id}: failed to commit transaction: {source}")]
    Commit {
        order_id: Uuid,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to query orders for account {account_id}: {source}")]
    Query {
        account_id: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to decode order row for account {account_id}: {source}")]
    Decode {
        account_id: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation deadline exceeded")]
    DeadlineExceeded,
}

/// The step of a store operation an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePhase {
    Connect,
    Validate,
    Begin,
    InsertHeader,
    BulkLoad,
    Commit,
    Read,
    Cancellation,
}

impl StorePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Validate => "validate",
            Self::Begin => "begin",
            Self::InsertHeader => "insert_header",
            Self::BulkLoad => "bulk_load",
            Self::Commit => "commit",
            Self::Read => "read",
            Self::Cancellation => "cancellation",
        }
    }
}

impl StoreError {
    pub fn phase(&self) -> StorePhase {
        match self {
            Self::Connect(_) | Self::Schema(_) => StorePhase::Connect,
            Self::EmptyOrder(_) | Self::InvalidQuantity { .. } => StorePhase::Validate,
            Self::Begin { .. } => StorePhase::Begin,
            Self::InsertHeader { .. } => StorePhase::InsertHeader,
            Self::BulkLoadPrepare { .. }
            | Self::BulkLoadAppend { .. }
            | Self::BulkLoadFlush { .. } => StorePhase::BulkLoad,
            Self::Commit { .. } => StorePhase::Commit,
            Self::Query { .. } | Self::Decode { .. } => StorePhase::Read,
            Self::Cancelled | Self::DeadlineExceeded => StorePhase::Cancellation,
        }
    }

    fn sqlx_source(&self) -> Option<&sqlx::Error> {
        match self {
            Self::Connect(source) | Self::Schema(source) => Some(source),
            Self::Begin { source, .. }
            | Self::InsertHeader { source, .. }
            | Self::BulkLoadPrepare { source, .. }
            | Self::BulkLoadAppend { source, .. }
            | Self::BulkLoadFlush { source, .. }
            | Self::Commit { source, .. }
            | Self::Query { source, .. }
            | Self::Decode { source, .. } => Some(source),
            Self::EmptyOrder(_)
            | Self::InvalidQuantity { .. }
            | Self::Cancelled
            | Self::DeadlineExceeded => None,
        }
    }

    /// Duplicate key, foreign key or check constraint rejected by the database.
    pub fn is_constraint_violation(&self) -> bool {
        match self.sqlx_source() {
            Some(sqlx::Error::Database(db)) => {
                db.is_unique_violation() || db.is_foreign_key_violation() || db.is_check_violation()
            }
            _ => false,
        }
    }

    /// The store could not be reached at all.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connect(_))
            || self.sqlx_source().is_some_and(is_connectivity_error)
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Classify a failure from the read stream: row decoding or the statement.
    pub(crate) fn from_read_error(account_id: &str, source: sqlx::Error) -> Self {
        let account_id = account_id.to_string();
        if is_decode_error(&source) {
            Self::Decode { account_id, source }
        } else {
            Self::Query { account_id, source }
        }
    }
}

pub(crate) fn is_connectivity_error(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

/// Row-level decode failures as opposed to a failed statement.
pub(crate) fn is_decode_error(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::Decode(_)
    )
}

impl IsTransient for StoreError {
    fn is_transient(&self) -> bool {
        self.is_connectivity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_classification() {
        let order_id = Uuid::now_v7();

        let header = StoreError::InsertHeader {
            order_id,
            source: sqlx::Error::Protocol("duplicate".into()),
        };
        assert_eq!(header.phase(), StorePhase::InsertHeader);

        let append = StoreError::BulkLoadAppend {
            order_id,
            product_id: "p1".to_string(),
            source: sqlx::Error::Protocol("bad row".into()),
        };
        assert_eq!(append.phase(), StorePhase::BulkLoad);
        assert!(append.to_string().contains("p1"));

        assert_eq!(StoreError::Cancelled.phase(), StorePhase::Cancellation);
        assert_eq!(StoreError::EmptyOrder(order_id).phase().as_str(), "validate");
    }

    #[test]
    fn test_connectivity_errors_are_transient() {
        assert!(StoreError::Connect(sqlx::Error::PoolTimedOut).is_transient());

        let commit = StoreError::Commit {
            order_id: Uuid::now_v7(),
            source: sqlx::Error::PoolClosed,
        };
        assert!(commit.is_connectivity());

        let decode = StoreError::Decode {
            account_id: "acc1".to_string(),
            source: sqlx::Error::ColumnNotFound("quantity".to_string()),
        };
        assert!(!decode.is_transient());
        assert!(!decode.is_constraint_violation());
    }

    #[test]
    fn test_cancellation_flags() {
        assert!(StoreError::Cancelled.is_cancellation());
        assert!(StoreError::DeadlineExceeded.is_cancellation());
        assert!(!StoreError::DeadlineExceeded.is_transient());
    }

    #[test]
    fn test_decode_error_detection() {
        assert!(is_decode_error(&sqlx::Error::ColumnNotFound("id".into())));
        assert!(!is_decode_error(&sqlx::Error::PoolTimedOut));
    }

    #[test]
    fn test_read_errors_split_into_decode_and_query() {
        let decode = StoreError::from_read_error("acc1", sqlx::Error::ColumnNotFound("id".into()));
        assert!(matches!(decode, StoreError::Decode { .. }));

        let query = StoreError::from_read_error("acc1", sqlx::Error::PoolTimedOut);
        assert!(matches!(query, StoreError::Query { ref account_id, .. } if account_id == "acc1"));
        assert!(query.is_connectivity());
    }
}
