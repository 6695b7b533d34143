//! Orders.

use chrono::{DateTime, Utc};
use neonflake_core::listing::{Listable, SortValue};
use neonflake_core::{CustomerId, OrderId, OrderStatus, PaymentStatus, Price};
use serde::{Deserialize, Serialize};

use super::null_as_empty;

/// A row of the `orders` table.
///
/// The customer's name and email are copied onto the order when it is
/// placed, so orders stay searchable without a join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(deserialize_with = "null_as_empty")]
    pub customer_name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub customer_email: String,
    pub amount: Price,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// Which column the orders search box matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSearchField {
    #[default]
    OrderId,
    Customer,
    Email,
}

impl OrderSearchField {
    pub const ALL: [Self; 3] = [Self::OrderId, Self::Customer, Self::Email];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OrderId => "order_id",
            Self::Customer => "customer",
            Self::Email => "email",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OrderId => "Order ID",
            Self::Customer => "Customer",
            Self::Email => "Email",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == value)
    }

    /// The field of `order` this search matches.
    #[must_use]
    pub fn field_of(self, order: &Order) -> &str {
        match self {
            Self::OrderId => order.id.as_str(),
            Self::Customer => &order.customer_name,
            Self::Email => &order.customer_email,
        }
    }
}

impl Listable for Order {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.id.as_str(), &self.customer_name, &self.customer_email]
    }

    #[allow(clippy::cast_precision_loss)]
    fn sort_value(&self, field: &str) -> SortValue<'_> {
        match field {
            // Numeric ids sort numerically
            "id" => self
                .id
                .as_str()
                .parse::<f64>()
                .map_or(SortValue::Text(self.id.as_str()), SortValue::Number),
            "customer" => SortValue::Text(&self.customer_name),
            "amount" => SortValue::Number(self.amount.to_f64()),
            "created_at" => SortValue::Number(self.created_at.timestamp_millis() as f64),
            _ => SortValue::Missing,
        }
    }
}

/// Partial update of an order's status columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    pub(crate) fn order(id: &str, amount: i64, status: OrderStatus, day: u32) -> Order {
        Order {
            id: OrderId::new(id),
            customer_id: Some(CustomerId::new("c-1")),
            customer_name: "Asha Rao".to_string(),
            customer_email: "asha@example.in".to_string(),
            amount: Price::new(Decimal::from(amount)),
            status,
            payment_status: PaymentStatus::Pending,
            created_at: Utc.with_ymd_and_hms(2025, 5, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_deserialize_order_row() {
        let json = r#"{
            "id": "1042", "customer_id": "c-9", "customer_name": "Vikram Shah",
            "customer_email": "vikram@example.in", "amount": "2499.00",
            "status": "new", "payment_status": "pending",
            "created_at": "2025-05-02T08:30:00Z"
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.amount.to_string(), "₹2,499");
    }

    #[test]
    fn test_numeric_ids_sort_numerically() {
        assert!(matches!(order("99", 1, OrderStatus::New, 1).sort_value("id"), SortValue::Number(n) if n == 99.0));
        assert!(matches!(order("ORD-7", 1, OrderStatus::New, 1).sort_value("id"), SortValue::Text("ORD-7")));
    }

    #[test]
    fn test_search_field_selection() {
        let o = order("1042", 10, OrderStatus::New, 1);
        assert_eq!(OrderSearchField::parse("email"), Some(OrderSearchField::Email));
        assert_eq!(OrderSearchField::parse("phone"), None);
        assert_eq!(OrderSearchField::Customer.field_of(&o), "Asha Rao");
        assert_eq!(OrderSearchField::OrderId.field_of(&o), "1042");
    }

    #[test]
    fn test_patch_serializes_only_set_columns() {
        let patch = OrderPatch {
            status: Some(OrderStatus::Processing),
            payment_status: None,
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({"status": "processing"})
        );
    }
}
