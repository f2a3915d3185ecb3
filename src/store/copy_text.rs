use uuid::Uuid;

use crate::domain::order::OrderedProduct;

// Postgres COPY text format: one line per row, tab separated columns,
// backslash escapes for the characters that would break framing.

pub const LINE_ITEM_COPY: &str =
    "COPY order_products (order_id, product_id, quantity) FROM STDIN (FORMAT text)";

pub fn line_item_row(order_id: Uuid, product: &OrderedProduct) -> String {
    let mut row = String::with_capacity(48 + product.id.len());
    row.push_str(&order_id.to_string());
    row.push('\t');
    push_escaped(&mut row, &product.id);
    row.push('\t');
    row.push_str(&product.quantity.to_string());
    row.push('\n');
    row
}

fn push_escaped(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
}
