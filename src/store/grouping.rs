use chrono::{DateTime, Utc};
use futures_util::{TryStream, TryStreamExt};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

use crate::domain::order::{Order, OrderedProduct};

// ============================================================================
// Order Row Grouping
// ============================================================================
//
// The read path fetches one flat row per line item (orders JOIN
// order_products) sorted by order id. Rows of one order are therefore
// contiguous, and a single pass folds them back into nested orders.
//
// The fold consumes rows in the order the stream yields them. Reordering the
// rows between the query and this fold breaks the contiguity the grouping
// relies on.
//
// ============================================================================

/// One row of the orders/order_products join.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub account_id: String,
    pub total_price: Decimal,
    pub product_id: String,
    pub quantity: u32,
}

impl<'r> FromRow<'r, PgRow> for OrderRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            created_at: row.try_get("created_at")?,
            account_id: row.try_get("account_id")?,
            total_price: row.try_get("total_price")?,
            product_id: row.try_get("product_id")?,
            quantity: decode_quantity(row.try_get("quantity")?)?,
        })
    }
}

/// Stored quantities are positive `INTEGER`s. Anything else is a column
/// decode error, not a zero-quantity line item.
pub(crate) fn decode_quantity(raw: i32) -> Result<u32, sqlx::Error> {
    match u32::try_from(raw) {
        Ok(quantity) if quantity > 0 => Ok(quantity),
        _ => Err(sqlx::Error::ColumnDecode {
            index: "quantity".to_string(),
            source: format!("line item quantity must be positive, got {raw}").into(),
        }),
    }
}

impl OrderRow {
    fn line_item(&self) -> OrderedProduct {
        OrderedProduct::stored(self.product_id.clone(), self.quantity)
    }

    fn into_order(self) -> Order {
        let first_item = self.line_item();
        Order {
            id: self.id,
            account_id: self.account_id,
            created_at: self.created_at,
            total_price: self.total_price,
            products: vec![first_item],
        }
    }
}

/// Fold state: finished orders plus the order currently being assembled.
#[derive(Debug, Default)]
struct Grouped {
    done: Vec<Order>,
    current: Option<Order>,
}

impl Grouped {
    fn push(mut self, row: OrderRow) -> Self {
        match self.current.as_mut() {
            Some(current) if current.id == row.id => {
                current.products.push(row.line_item());
            }
            _ => {
                if let Some(previous) = self.current.take() {
                    self.done.push(previous);
                }
                self.current = Some(row.into_order());
            }
        }
        self
    }

    fn finish(mut self) -> Vec<Order> {
        if let Some(last) = self.current.take() {
            self.done.push(last);
        }
        self.done
    }
}

/// Groups a sorted row stream into orders.
///
/// Any error from the stream aborts the whole fold; callers never see a
/// partially built sequence.
pub async fn group_rows<S>(rows: S) -> Result<Vec<Order>, S::Error>
where
    S: TryStream<Ok = OrderRow>,
{
    let grouped = rows
        .try_fold(Grouped::default(), |grouped, row| async move { Ok(grouped.push(row)) })
        .await?;

    Ok(grouped.finish())
}

/// Synchronous counterpart of [`group_rows`] for rows already in memory.
pub fn group_sorted_rows<I>(rows: I) -> Vec<Order>
where
    I: IntoIterator<Item = OrderRow>,
{
    rows.into_iter()
        .fold(Grouped::default(), Grouped::push)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use futures_util::stream;

    fn row(order_id: Uuid, total: i64, product_id: &str, quantity: u32) -> OrderRow {
        OrderRow {
            id: order_id,
            created_at: Utc::now(),
            account_id: "acc1".to_string(),
            total_price: Decimal::new(total, 0),
            product_id: product_id.to_string(),
            quantity,
        }
    }

    fn three_orders() -> (Vec<Uuid>, Vec<OrderRow>) {
        let mut ids = vec![Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7()];
        ids.sort();

        let rows = vec![
            row(ids[0], 10, "a", 1),
            row(ids[0], 10, "b", 2),
            row(ids[1], 20, "c", 3),
            row(ids[2], 30, "d", 1),
            row(ids[2], 30, "e", 4),
            row(ids[2], 30, "f", 5),
        ];
        (ids, rows)
    }

    #[tokio::test]
    async fn test_group_rows_rebuilds_each_order() {
        let (ids, rows) = three_orders();

        let orders = group_rows(stream::iter(rows.into_iter().map(Ok::<_, String>)))
            .await
            .unwrap();

        assert_eq!(orders.len(), 3);
        assert_eq!(orders.iter().map(|o| o.id).collect::<Vec<_>>(), ids);
        assert_eq!(orders[0].products.len(), 2);
        assert_eq!(orders[1].products.len(), 1);
        assert_eq!(orders[2].products.len(), 3);

        assert_eq!(orders[0].total_price, Decimal::new(10, 0));
        assert_eq!(orders[1].products[0].id, "c");
        assert_eq!(orders[1].products[0].quantity, 3);
        let third: Vec<&str> = orders[2].products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(third, vec!["d", "e", "f"]);
    }

    #[tokio::test]
    async fn test_group_rows_empty_stream_yields_no_orders() {
        let orders = group_rows(stream::iter(Vec::<Result<OrderRow, String>>::new()))
            .await
            .unwrap();
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_group_rows_error_discards_partial_result() {
        let (_, rows) = three_orders();
        let mut items: Vec<Result<OrderRow, String>> = rows.into_iter().map(Ok).collect();
        items.insert(4, Err("malformed column".to_string()));

        let result = group_rows(stream::iter(items)).await;
        assert_eq!(result.unwrap_err(), "malformed column");
    }

    #[tokio::test]
    async fn test_group_rows_single_row() {
        let id = Uuid::now_v7();
        let orders = group_rows(stream::iter(vec![Ok::<_, String>(row(id, 20, "p1", 2))]))
            .await
            .unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, id);
        assert_eq!(orders[0].products, vec![OrderedProduct::stored("p1", 2)]);
    }

    #[test]
    fn test_group_sorted_rows_matches_streaming_fold() {
        let (ids, rows) = three_orders();
        let orders = group_sorted_rows(rows);

        assert_eq!(orders.len(), 3);
        assert_eq!(orders[2].id, ids[2]);
        assert_eq!(
            orders.iter().map(Order::item_count).sum::<usize>(),
            6
        );
    }

    #[test]
    fn test_non_contiguous_rows_split_into_separate_orders() {
        // Rows out of order id order are not merged back together.
        let id = Uuid::now_v7();
        let other = Uuid::now_v7();
        let orders = group_sorted_rows(vec![
            row(id, 1, "a", 1),
            row(other, 2, "b", 1),
            row(id, 1, "c", 1),
        ]);
        assert_eq!(orders.len(), 3);
    }

    #[test]
    fn test_decode_quantity_accepts_positive_values() {
        assert_eq!(decode_quantity(1).unwrap(), 1);
        assert_eq!(decode_quantity(i32::MAX).unwrap(), i32::MAX as u32);
    }

    #[test]
    fn test_decode_quantity_rejects_zero_and_negative() {
        for raw in [0, -1, i32::MIN] {
            let err = decode_quantity(raw).unwrap_err();
            assert!(matches!(err, sqlx::Error::ColumnDecode { ref index, .. } if index == "quantity"));
        }
    }

    #[test]
    fn test_negative_quantity_surfaces_as_decode_failure() {
        let source = decode_quantity(-1).unwrap_err();
        let err = StoreError::from_read_error("acc1", source);
        assert!(matches!(err, StoreError::Decode { ref account_id, .. } if account_id == "acc1"));
    }
}
