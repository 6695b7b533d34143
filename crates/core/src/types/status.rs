//! Status and catalog enums stored as text columns in the backend.
//!
//! Each enum round-trips through its wire string (`as_str` / `FromStr`,
//! also used by serde) and has a human label for templates.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when a wire string does not name a known variant.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => ($wire:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every variant, in display order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The value stored in the backend.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }

            /// Human-readable label.
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    _ => Err(ParseEnumError {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = String::deserialize(deserializer)?;
                value.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

text_enum! {
    /// Order lifecycle status.
    ///
    /// Any status may move to any other; the dashboard does not enforce a
    /// transition table.
    OrderStatus, "order status" {
        New => ("new", "New"),
        Processing => ("processing", "Processing"),
        Delivered => ("delivered", "Delivered"),
        Cancelled => ("cancelled", "Cancelled"),
    }
}

text_enum! {
    /// Payment state of an order.
    PaymentStatus, "payment status" {
        Paid => ("paid", "Paid"),
        Pending => ("pending", "Pending"),
        Failed => ("failed", "Failed"),
    }
}

text_enum! {
    /// Catalog availability of a product.
    ProductStatus, "product status" {
        Active => ("active", "Active"),
        Inactive => ("inactive", "Inactive"),
        OutOfStock => ("out_of_stock", "Out of Stock"),
    }
}

text_enum! {
    /// Product category.
    ProductCategory, "product category" {
        Electronics => ("electronics", "Electronics"),
        Clothing => ("clothing", "Clothing"),
        Accessories => ("accessories", "Accessories"),
    }
}

text_enum! {
    /// Available product colors.
    ProductColor, "product color" {
        Red => ("red", "Red"),
        Blue => ("blue", "Blue"),
        Green => ("green", "Green"),
        Black => ("black", "Black"),
        White => ("white", "White"),
    }
}

text_enum! {
    /// GST slab applied to a product, stored as the bare percentage.
    GstRate, "GST rate" {
        Five => ("5", "5%"),
        Twelve => ("12", "12%"),
        Eighteen => ("18", "18%"),
        TwentyEight => ("28", "28%"),
    }
}

text_enum! {
    /// Outcome of a login attempt recorded in the audit trail.
    LoginStatus, "login status" {
        Success => ("success", "Success"),
        Failed => ("failed", "Failed"),
    }
}

impl OrderStatus {
    /// Orders in this status contribute to revenue.
    #[must_use]
    pub const fn counts_towards_revenue(self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}
