// ============================================================================
// Order Schema
// ============================================================================
//
// Bootstrap DDL only: every statement is idempotent and runs at startup,
// the way the service used to create its keyspace. There is no migration
// history.
//
// `total_price` is unconstrained NUMERIC so any `Decimal` the service
// computes is stored exactly. A typmod would round or reject it.
//
// ============================================================================

pub const CREATE_ORDERS: &str = "CREATE TABLE IF NOT EXISTS orders (
    id UUID PRIMARY KEY,
    created_at TIMESTAMPTZ NOT NULL,
    account_id TEXT NOT NULL,
    total_price NUMERIC NOT NULL CHECK (total_price >= 0)
)";

pub const CREATE_ORDER_PRODUCTS: &str = "CREATE TABLE IF NOT EXISTS order_products (
    order_id UUID NOT NULL REFERENCES orders (id) ON DELETE CASCADE,
    product_id TEXT NOT NULL,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    PRIMARY KEY (order_id, product_id)
)";

pub const CREATE_ACCOUNT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS orders_account_id_idx ON orders (account_id)";

/// Widens a `total_price` column created with a precision/scale.
pub const UNCONSTRAIN_TOTAL_PRICE: &str = "ALTER TABLE orders ALTER COLUMN total_price TYPE NUMERIC";

pub const ALL: [&str; 4] = [
    CREATE_ORDERS,
    UNCONSTRAIN_TOTAL_PRICE,
    CREATE_ORDER_PRODUCTS,
    CREATE_ACCOUNT_INDEX,
];

pub const INSERT_ORDER: &str =
    "INSERT INTO orders (id, created_at, account_id, total_price) VALUES ($1, $2, $3, $4)";

pub const SELECT_ORDERS_FOR_ACCOUNT: &str = "SELECT
    o.id,
    o.created_at,
    o.account_id,
    o.total_price,
    op.product_id,
    op.quantity
FROM orders o
JOIN order_products op ON o.id = op.order_id
WHERE o.account_id = $1
ORDER BY o.id, op.product_id";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_price_has_no_precision_or_scale() {
        assert!(CREATE_ORDERS.contains("total_price NUMERIC NOT NULL"));
        assert!(!CREATE_ORDERS.contains("NUMERIC("));
        assert!(UNCONSTRAIN_TOTAL_PRICE.ends_with("TYPE NUMERIC"));
    }

    #[test]
    fn test_columns_are_widened_before_use() {
        let create = ALL.iter().position(|s| *s == CREATE_ORDERS).unwrap();
        let alter = ALL.iter().position(|s| *s == UNCONSTRAIN_TOTAL_PRICE).unwrap();
        assert!(create < alter);
    }
}
