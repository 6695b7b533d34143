//! Products and the product form.

use chrono::{DateTime, Utc};
use neonflake_core::form::{FormErrors, Validator};
use neonflake_core::listing::{Listable, SortValue};
use neonflake_core::{GstRate, Price, ProductCategory, ProductColor, ProductId, ProductStatus};
use serde::{Deserialize, Serialize};

use super::null_as_empty;

/// Maximum product name length.
pub const PRODUCT_NAME_MAX: usize = 50;
/// Maximum description length.
pub const PRODUCT_DESCRIPTION_MAX: usize = 500;
/// Image slots on the product form; the first is required.
pub const PRODUCT_IMAGE_SLOTS: usize = 4;

/// A row of the `products` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: ProductCategory,
    pub list_price: Price,
    pub sale_price: Price,
    pub gst: GstRate,
    pub status: ProductStatus,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(rename = "colors", default)]
    pub color: Option<ProductColor>,
    /// Storage paths inside the `product-images` bucket.
    #[serde(default)]
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Listable for Product {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name, self.category.as_str()]
    }

    #[allow(clippy::cast_precision_loss)]
    fn sort_value(&self, field: &str) -> SortValue<'_> {
        match field {
            "name" => SortValue::Text(&self.name),
            "category" => SortValue::Text(self.category.as_str()),
            "list_price" => SortValue::Number(self.list_price.to_f64()),
            "sale_price" => SortValue::Number(self.sale_price.to_f64()),
            "created_at" => SortValue::Number(self.created_at.timestamp_millis() as f64),
            _ => SortValue::Missing,
        }
    }
}

/// Text values of the product form, as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductDraft {
    pub name: String,
    pub category: String,
    pub list_price: String,
    pub sale_price: String,
    pub gst: String,
    pub status: String,
    pub description: String,
    pub colors: String,
}

/// A validated product, ready to be stored once its images are uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProduct {
    pub name: String,
    pub category: ProductCategory,
    pub list_price: Price,
    pub sale_price: Price,
    pub gst: GstRate,
    pub status: ProductStatus,
    pub description: String,
    pub color: ProductColor,
}

impl ProductDraft {
    /// Parse and check every field.
    ///
    /// # Errors
    ///
    /// Returns the per-field errors.
    pub fn validate(&self) -> Result<ValidProduct, FormErrors> {
        let mut v = Validator::new();
        v.required("name", "Product name", &self.name)
            .max_chars("name", "Product name", self.name.trim(), PRODUCT_NAME_MAX)
            .required("category", "Category", &self.category)
            .required("list_price", "List price", &self.list_price)
            .required("sale_price", "Sale price", &self.sale_price)
            .required("gst", "GST", &self.gst)
            .required("status", "Status", &self.status)
            .required("description", "Description", &self.description)
            .max_chars("description", "Description", self.description.trim(), PRODUCT_DESCRIPTION_MAX)
            .required("colors", "Color", &self.colors);

        let category = self.category.parse::<ProductCategory>();
        let gst = self.gst.parse::<GstRate>();
        let status = self.status.parse::<ProductStatus>();
        let color = self.colors.parse::<ProductColor>();
        let list_price = Price::parse(&self.list_price);
        let sale_price = Price::parse(&self.sale_price);

        v.check(category.is_ok(), "category", "Please select a category")
            .check(gst.is_ok(), "gst", "Please select a GST rate")
            .check(status.is_ok(), "status", "Please select a status")
            .check(color.is_ok(), "colors", "Please select a color");
        if let Err(e) = &list_price {
            v.check(false, "list_price", &format!("List {e}"));
        }
        if let Err(e) = &sale_price {
            v.check(false, "sale_price", &format!("Sale {e}"));
        }
        if let (Ok(list), Ok(sale)) = (&list_price, &sale_price) {
            v.check(sale <= list, "sale_price", "Sale price cannot exceed list price");
        }
        v.finish()?;

        match (category, list_price, sale_price, gst, status, color) {
            (Ok(category), Ok(list_price), Ok(sale_price), Ok(gst), Ok(status), Ok(color)) => {
                Ok(ValidProduct {
                    name: self.name.trim().to_string(),
                    category,
                    list_price,
                    sale_price,
                    gst,
                    status,
                    description: self.description.trim().to_string(),
                    color,
                })
            }
            // Every parse failure was recorded above
            _ => Err(FormErrors::new()),
        }
    }
}

impl ValidProduct {
    /// Insert payload referencing uploaded image paths.
    #[must_use]
    pub fn record<'a>(&'a self, images: &'a [String]) -> NewProductRecord<'a> {
        NewProductRecord {
            name: &self.name,
            category: self.category,
            list_price: self.list_price,
            sale_price: self.sale_price,
            gst: self.gst,
            status: self.status,
            description: &self.description,
            colors: self.color,
            images,
        }
    }
}

/// Columns written when a product is created.
#[derive(Debug, Serialize)]
pub struct NewProductRecord<'a> {
    pub name: &'a str,
    pub category: ProductCategory,
    pub list_price: Price,
    pub sale_price: Price,
    pub gst: GstRate,
    pub status: ProductStatus,
    pub description: &'a str,
    pub colors: ProductColor,
    pub images: &'a [String],
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    pub(crate) fn valid_draft() -> ProductDraft {
        ProductDraft {
            name: "Cotton Kurta".into(),
            category: "clothing".into(),
            list_price: "1,999".into(),
            sale_price: "1499.50".into(),
            gst: "12".into(),
            status: "active".into(),
            description: "Hand block printed.".into(),
            colors: "blue".into(),
        }
    }

    pub(crate) fn product(id: &str, name: &str, category: ProductCategory, sale: i64, day: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            category,
            list_price: Price::new(Decimal::from(sale + 100)),
            sale_price: Price::new(Decimal::from(sale)),
            gst: GstRate::Eighteen,
            status: ProductStatus::Active,
            description: String::new(),
            color: Some(ProductColor::Black),
            images: vec!["1718000000000-front.jpg".to_string()],
            created_at: Utc.with_ymd_and_hms(2025, 4, day, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_validate_parses_every_field() {
        let valid = valid_draft().validate().unwrap();
        assert_eq!(valid.category, ProductCategory::Clothing);
        assert_eq!(valid.list_price.to_string(), "₹1,999");
        assert_eq!(valid.gst, GstRate::Twelve);
        assert_eq!(valid.color, ProductColor::Blue);
    }

    #[test]
    fn test_validate_limits_and_choices() {
        let mut draft = valid_draft();
        draft.name = "x".repeat(51);
        draft.gst = "15".into();
        draft.description = "d".repeat(501);
        let errors = draft.validate().unwrap_err();
        assert_eq!(errors.get("name"), Some("Product name must be at most 50 characters"));
        assert_eq!(errors.get("gst"), Some("Please select a GST rate"));
        assert_eq!(errors.get("description"), Some("Description must be at most 500 characters"));
    }

    #[test]
    fn test_sale_price_above_list_price_is_rejected() {
        let mut draft = valid_draft();
        draft.sale_price = "2500".into();
        let errors = draft.validate().unwrap_err();
        assert_eq!(errors.get("sale_price"), Some("Sale price cannot exceed list price"));
    }

    #[test]
    fn test_invalid_price_reports_reason() {
        let mut draft = valid_draft();
        draft.list_price = "abc".into();
        let errors = draft.validate().unwrap_err();
        assert_eq!(errors.get("list_price"), Some("List price must be a number"));
    }

    #[test]
    fn test_record_shape() {
        let valid = valid_draft().validate().unwrap();
        let images = vec!["1718000000000-front.jpg".to_string()];
        let json = serde_json::to_value(valid.record(&images)).unwrap();
        assert_eq!(json["colors"], "blue");
        assert_eq!(json["gst"], "12");
        assert_eq!(json["list_price"], "1999");
        assert_eq!(json["images"], serde_json::json!(["1718000000000-front.jpg"]));
    }
}
