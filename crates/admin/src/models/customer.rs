//! Customers and the customer form.

use chrono::{DateTime, Utc};
use neonflake_core::form::{FormErrors, Validator};
use neonflake_core::listing::{Listable, SortValue};
use neonflake_core::normalize::{FieldNormalizer, GST_NUMBER_LEN, PHONE_DIGITS};
use neonflake_core::{CustomerId, OrderId, OrderStatus, Price};
use serde::{Deserialize, Serialize};

use super::{non_empty, null_as_empty};

/// Columns requested for customer rows, with their orders embedded.
pub const CUSTOMER_SELECT: &str = "*,orders(id,amount,status,created_at)";

/// A row of the `customers` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    #[serde(deserialize_with = "null_as_empty")]
    pub first_name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub last_name: String,
    pub email: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub phone: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub street_address: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub country: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub state: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub zip_code: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub gst_number: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Present only when selected with [`CUSTOMER_SELECT`].
    #[serde(default, skip_serializing)]
    pub orders: Vec<CustomerOrder>,
}

/// An order embedded in a customer row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerOrder {
    pub id: OrderId,
    pub amount: Price,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// A customer with the aggregates shown in the list and detail views.
#[derive(Debug, Clone)]
pub struct CustomerSummary {
    pub customer: Customer,
    pub name: String,
    pub total_orders: usize,
    pub total_spent: Price,
    pub last_purchase: Option<DateTime<Utc>>,
}

impl From<Customer> for CustomerSummary {
    fn from(customer: Customer) -> Self {
        let name = format!("{} {}", customer.first_name, customer.last_name)
            .trim()
            .to_string();
        let total_spent = customer.orders.iter().map(|o| o.amount).sum();
        let last_purchase = customer.orders.iter().map(|o| o.created_at).max();
        Self {
            name,
            total_orders: customer.orders.len(),
            total_spent,
            last_purchase,
            customer,
        }
    }
}

impl Listable for CustomerSummary {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.customer.email, &self.customer.phone]
    }

    #[allow(clippy::cast_precision_loss)]
    fn sort_value(&self, field: &str) -> SortValue<'_> {
        match field {
            "name" => SortValue::Text(&self.name),
            "email" => SortValue::Text(&self.customer.email),
            "total_orders" => SortValue::Number(self.total_orders as f64),
            "total_spent" => SortValue::Number(self.total_spent.to_f64()),
            "created_at" => SortValue::Number(self.customer.created_at.timestamp_millis() as f64),
            _ => SortValue::Missing,
        }
    }
}

/// Field identifiers of the customer form, in display order.
pub const CUSTOMER_FIELDS: &[&str] = &[
    "first_name",
    "last_name",
    "email",
    "phone",
    "street_address",
    "country",
    "city",
    "state",
    "zip_code",
    "company_name",
    "gst_number",
];

/// Values of the customer form as typed (after normalization).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub street_address: String,
    pub country: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub company_name: String,
    pub gst_number: String,
}

impl CustomerDraft {
    /// Prefill from an existing customer for editing.
    #[must_use]
    pub fn from_customer(customer: &Customer) -> Self {
        Self {
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            email: customer.email.clone(),
            phone: customer.phone.clone(),
            street_address: customer.street_address.clone(),
            country: customer.country.clone(),
            city: customer.city.clone(),
            state: customer.state.clone(),
            zip_code: customer.zip_code.clone(),
            company_name: customer.company_name.clone().unwrap_or_default(),
            gst_number: customer.gst_number.clone().unwrap_or_default(),
        }
    }

    /// Current value of a form field, or `None` for an unknown field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        Some(match field {
            "first_name" => &self.first_name,
            "last_name" => &self.last_name,
            "email" => &self.email,
            "phone" => &self.phone,
            "street_address" => &self.street_address,
            "country" => &self.country,
            "city" => &self.city,
            "state" => &self.state,
            "zip_code" => &self.zip_code,
            "company_name" => &self.company_name,
            "gst_number" => &self.gst_number,
            _ => return None,
        })
    }

    fn field_mut(&mut self, field: &str) -> Option<&mut String> {
        Some(match field {
            "first_name" => &mut self.first_name,
            "last_name" => &mut self.last_name,
            "email" => &mut self.email,
            "phone" => &mut self.phone,
            "street_address" => &mut self.street_address,
            "country" => &mut self.country,
            "city" => &mut self.city,
            "state" => &mut self.state,
            "zip_code" => &mut self.zip_code,
            "company_name" => &mut self.company_name,
            "gst_number" => &mut self.gst_number,
            _ => return None,
        })
    }

    /// Store a changed field, normalized. Returns the stored value, or
    /// `None` for an unknown field.
    pub fn set(&mut self, field: &str, value: &str, normalizer: &FieldNormalizer) -> Option<&str> {
        let slot = self.field_mut(field)?;
        *slot = normalizer.apply(field, value);
        Some(slot.as_str())
    }

    /// Normalize every field in place.
    pub fn normalize(&mut self, normalizer: &FieldNormalizer) {
        for field in CUSTOMER_FIELDS {
            if let Some(slot) = self.field_mut(field) {
                *slot = normalizer.apply(field, slot);
            }
        }
    }

    /// Check required fields and formats.
    ///
    /// # Errors
    ///
    /// Returns the per-field errors.
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut v = Validator::new();
        v.required("first_name", "First name", &self.first_name)
            .required("last_name", "Last name", &self.last_name)
            .required("email", "Email", &self.email)
            .email("email", &self.email)
            .required("phone", "Phone number", &self.phone)
            .exact_digits("phone", "Phone number", &self.phone, PHONE_DIGITS)
            .required("street_address", "Street address", &self.street_address)
            .required("country", "Country", &self.country)
            .required("city", "City", &self.city)
            .required("state", "State", &self.state)
            .required("zip_code", "ZIP code", &self.zip_code)
            .exact_len_if_present("gst_number", "GST number", &self.gst_number, GST_NUMBER_LEN);
        v.finish()
    }

    /// Insert/update payload.
    #[must_use]
    pub fn record(&self) -> CustomerRecord<'_> {
        CustomerRecord {
            first_name: &self.first_name,
            last_name: &self.last_name,
            email: &self.email,
            phone: &self.phone,
            street_address: &self.street_address,
            country: &self.country,
            city: &self.city,
            state: &self.state,
            zip_code: &self.zip_code,
            company_name: non_empty(&self.company_name),
            gst_number: non_empty(&self.gst_number),
            updated_at: Utc::now(),
        }
    }
}

/// Columns written by the customer form.
#[derive(Debug, Serialize)]
pub struct CustomerRecord<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub street_address: &'a str,
    pub country: &'a str,
    pub city: &'a str,
    pub state: &'a str,
    pub zip_code: &'a str,
    pub company_name: Option<&'a str>,
    pub gst_number: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn customer(id: &str, first: &str, last: &str, email: &str) -> Customer {
        Customer {
            id: CustomerId::new(id),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.to_string(),
            phone: "9876543210".to_string(),
            street_address: "12 MG Road".to_string(),
            country: "India".to_string(),
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            zip_code: "560001".to_string(),
            company_name: None,
            gst_number: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap(),
            updated_at: None,
            orders: Vec::new(),
        }
    }

    pub(crate) fn valid_draft() -> CustomerDraft {
        CustomerDraft {
            first_name: "Asha".into(),
            last_name: "Rao".into(),
            email: "asha@example.in".into(),
            phone: "9876543210".into(),
            street_address: "12 MG Road".into(),
            country: "India".into(),
            city: "Bengaluru".into(),
            state: "Karnataka".into(),
            zip_code: "560001".into(),
            company_name: String::new(),
            gst_number: String::new(),
        }
    }

    #[test]
    fn test_deserialize_with_embedded_orders() {
        let json = r#"{
            "id": "c-1", "first_name": "Asha", "last_name": "Rao",
            "email": "asha@example.in", "phone": "9876543210",
            "street_address": null, "country": "India", "city": "Pune",
            "state": "MH", "zip_code": "411001", "company_name": null,
            "gst_number": null, "created_at": "2025-01-15T10:00:00+00:00",
            "updated_at": "2025-01-16T10:00:00+00:00",
            "orders": [
                {"id": "1001", "amount": 1999.5, "status": "delivered", "created_at": "2025-02-01T09:00:00+00:00"},
                {"id": "1002", "amount": 500, "status": "cancelled", "created_at": "2025-03-01T09:00:00+00:00"}
            ]
        }"#;
        let customer: Customer = serde_json::from_str(json).unwrap();
        assert_eq!(customer.street_address, "");

        let summary = CustomerSummary::from(customer);
        assert_eq!(summary.name, "Asha Rao");
        assert_eq!(summary.total_orders, 2);
        assert_eq!(summary.total_spent.to_string(), "₹2,499.50");
        assert_eq!(
            summary.last_purchase,
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_search_fields_are_name_email_phone() {
        let summary = CustomerSummary::from(customer("c-1", "Ravi", "Kumar", "ravi@x.in"));
        assert_eq!(summary.search_fields(), vec!["Ravi Kumar", "ravi@x.in", "9876543210"]);
    }

    #[test]
    fn test_set_normalizes_and_rejects_unknown_fields() {
        let normalizer = FieldNormalizer::customer();
        let mut draft = CustomerDraft::default();
        assert_eq!(draft.set("phone", "+91 98765 43210", &normalizer), Some("9876543210"));
        assert_eq!(draft.set("city", "mysuru", &normalizer), Some("Mysuru"));
        assert_eq!(draft.set("company_name", " as typed", &normalizer), Some(" as typed"));
        assert_eq!(draft.set("favourite_colour", "blue", &normalizer), None);
    }

    #[test]
    fn test_validate_reports_each_field() {
        let mut draft = valid_draft();
        assert!(draft.validate().is_ok());

        draft.email = "asha-at-example".into();
        draft.phone = "98765".into();
        draft.gst_number = "22AAAAA".into();
        draft.city.clear();
        let errors = draft.validate().unwrap_err();
        assert_eq!(errors.get("email"), Some("Please enter a valid email address"));
        assert_eq!(errors.get("phone"), Some("Phone number must be exactly 10 digits"));
        assert_eq!(errors.get("gst_number"), Some("GST number must be exactly 15 characters"));
        assert_eq!(errors.get("city"), Some("City is required"));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_record_omits_blank_optional_columns() {
        let draft = valid_draft();
        let json = serde_json::to_value(draft.record()).unwrap();
        assert_eq!(json["company_name"], serde_json::Value::Null);
        assert_eq!(json["email"], "asha@example.in");
        assert!(json.get("id").is_none());
    }
}
