//! CSV export of order and customer lists.

use neonflake_core::time::{format_date, format_datetime};

use super::notifications::Notifier;
use crate::models::{CustomerSummary, Order};

/// Column headers of the orders export.
pub const ORDER_EXPORT_HEADERS: [&str; 7] = [
    "Order ID",
    "Customer",
    "Email",
    "Amount",
    "Date",
    "Payment Status",
    "Order Status",
];

/// Column headers of the customers export.
pub const CUSTOMER_EXPORT_HEADERS: [&str; 10] = [
    "Name",
    "Email",
    "Phone",
    "City",
    "State",
    "Company",
    "GST Number",
    "Total Orders",
    "Total Spent",
    "Date Registered",
];

/// Leading characters a spreadsheet reads as the start of a formula.
const FORMULA_PREFIXES: &[char] = &['=', '+', '-', '@'];

/// Quote a field when it contains a delimiter, quote, or line break.
/// Fields that would open as a formula are prefixed with `'` first.
fn csv_escape(value: &str) -> String {
    let value = if value.starts_with(FORMULA_PREFIXES) {
        format!("'{value}")
    } else {
        value.to_string()
    };
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value
    }
}

fn csv_line<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| csv_escape(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Encode `orders` as CSV with a header row.
#[must_use]
pub fn orders_csv<'a>(orders: impl IntoIterator<Item = &'a Order>) -> String {
    let mut lines = vec![csv_line(&ORDER_EXPORT_HEADERS)];
    for order in orders {
        lines.push(csv_line(&[
            order.id.to_string(),
            order.customer_name.clone(),
            order.customer_email.clone(),
            order.amount.to_string(),
            format_datetime(&order.created_at),
            order.payment_status.label().to_string(),
            order.status.label().to_string(),
        ]));
    }
    lines.join("\n") + "\n"
}

/// Encode customer rows as CSV with a header row.
#[must_use]
pub fn customers_csv<'a>(customers: impl IntoIterator<Item = &'a CustomerSummary>) -> String {
    let mut lines = vec![csv_line(&CUSTOMER_EXPORT_HEADERS)];
    for summary in customers {
        let c = &summary.customer;
        lines.push(csv_line(&[
            summary.name.clone(),
            c.email.clone(),
            c.phone.clone(),
            c.city.clone(),
            c.state.clone(),
            c.company_name.clone().unwrap_or_default(),
            c.gst_number.clone().unwrap_or_default(),
            summary.total_orders.to_string(),
            summary.total_spent.to_string(),
            format_date(&c.created_at),
        ]));
    }
    lines.join("\n") + "\n"
}

/// Builds export files and reports the outcome.
#[derive(Debug, Clone)]
pub struct ExportService {
    notifier: Notifier,
}

impl ExportService {
    #[must_use]
    pub const fn new(notifier: Notifier) -> Self {
        Self { notifier }
    }

    /// CSV of the given new orders, or `None` when there is nothing to
    /// export.
    pub fn new_orders(&self, orders: &[&Order]) -> Option<Vec<u8>> {
        if orders.is_empty() {
            self.notifier.info("No new orders to export");
            return None;
        }
        let text = orders_csv(orders.iter().copied());
        tracing::info!(rows = orders.len(), "Exported orders");
        self.notifier.success("Orders exported successfully");
        Some(text.into_bytes())
    }

    /// CSV of the given customers, or `None` when there is nothing to
    /// export.
    pub fn customers(&self, customers: &[&CustomerSummary]) -> Option<Vec<u8>> {
        if customers.is_empty() {
            self.notifier.info("No customers to export");
            return None;
        }
        let text = customers_csv(customers.iter().copied());
        tracing::info!(rows = customers.len(), "Exported customers");
        self.notifier.success("Customers exported successfully");
        Some(text.into_bytes())
    }
}
