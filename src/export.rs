use crate::order::Order;

/// Header of the order listing export
pub const ORDER_COLUMNS: [&str; 6] = [
    "Order ID",
    "Name",
    "Method",
    "Amount",
    "Status",
    "Created Date",
];

/// Header of the invoice detail export
pub const INVOICE_COLUMNS: [&str; 6] = ["NO", "Product", "Options", "Quantity", "Price", "Amount"];

/// Convert a list of orders to CSV format
///
/// This function exports the order table to CSV (Comma-Separated Values) format.
/// It creates a string where:
/// - The first row holds the column headers
/// - Each following row is one order
/// - Special characters (commas, quotes, line breaks) are properly escaped
///
/// # Arguments
/// * `orders` - Orders to export, in display order
///
/// # Returns
/// * `String` - CSV content
///
/// # Examples
/// ```
/// use shop_admin::export::orders_to_csv;
///
/// let csv = orders_to_csv(&[]);
/// assert_eq!(csv, "Order ID,Name,Method,Amount,Status,Created Date\n");
/// ```
pub fn orders_to_csv(orders: &[Order]) -> String {
    let mut csv_content = String::new();
    push_row(&mut csv_content, ORDER_COLUMNS.iter().map(|c| c.to_string()));

    for order in orders {
        push_row(
            &mut csv_content,
            [
                order.order_id.clone(),
                order.user_infor.name.clone(),
                order.payment_method.clone(),
                format_amount(order.total),
                order.status.to_string(),
                order.created_at.clone(),
            ],
        );
    }

    csv_content
}

/// Convert a single order's line items to CSV format
///
/// Rows are numbered from 1. Options are joined with " / " and the amount
/// column is price times quantity.
///
/// # Arguments
/// * `order` - The order to itemise
///
/// # Returns
/// * `String` - CSV content
pub fn invoice_to_csv(order: &Order) -> String {
    let mut csv_content = String::new();
    push_row(&mut csv_content, INVOICE_COLUMNS.iter().map(|c| c.to_string()));

    for (index, item) in order.items.iter().enumerate() {
        push_row(
            &mut csv_content,
            [
                (index + 1).to_string(),
                item.name.clone(),
                item.options.join(" / "),
                item.quantity.to_string(),
                format_amount(item.price),
                format_amount(item.amount()),
            ],
        );
    }

    csv_content
}

fn push_row(csv_content: &mut String, fields: impl IntoIterator<Item = String>) {
    for (i, value) in fields.into_iter().enumerate() {
        if i > 0 {
            csv_content.push(',');
        }
        // Handle value - escape commas, quotes, line breaks as needed
        if value.contains([',', '"', '\n', '\r']) {
            let escaped = value.replace('"', "\"\"");
            csv_content.push_str(&format!("\"{}\"", escaped));
        } else {
            csv_content.push_str(&value);
        }
    }
    csv_content.push('\n');
}

/// Whole amounts print without a fractional part.
fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}
