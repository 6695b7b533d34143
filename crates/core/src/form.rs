//! Field-level form validation.
//!
//! Validation runs on already-normalized values and never touches the
//! network. Errors are keyed by field identifier so templates can render
//! them inline, and the first message per field wins.
//!
//! ```
//! use neonflake_core::form::Validator;
//!
//! let mut v = Validator::new();
//! v.required("first_name", "First name", "")
//!     .email("email", "not-an-email")
//!     .exact_digits("phone", "Phone", "98765", 10);
//!
//! let errors = v.finish().unwrap_err();
//! assert_eq!(errors.get("first_name"), Some("First name is required"));
//! assert_eq!(errors.len(), 3);
//! ```

use std::fmt;

use serde::Serialize;

use crate::Email;

/// A validation failure on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Ordered collection of field errors, at most one per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors {
    errors: Vec<FieldError>,
}

impl FormErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` for `field` unless the field already has an error.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let field = field.into();
        if self.get(&field).is_none() {
            self.errors.push(FieldError {
                field,
                message: message.into(),
            });
        }
    }

    /// The message recorded for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns `self` if any field error was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            f.write_str(&error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for FormErrors {}

/// Chainable checks that accumulate into [`FormErrors`].
#[derive(Debug, Default)]
pub struct Validator {
    errors: FormErrors,
}

impl Validator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The value must not be blank.
    pub fn required(&mut self, field: &str, label: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.errors.add(field, format!("{label} is required"));
        }
        self
    }

    /// The value must parse as an [`Email`].
    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if Email::parse(value).is_err() {
            self.errors.add(field, "Please enter a valid email address");
        }
        self
    }

    /// The value must be exactly `count` ASCII digits.
    pub fn exact_digits(&mut self, field: &str, label: &str, value: &str, count: usize) -> &mut Self {
        if value.len() != count || !value.chars().all(|c| c.is_ascii_digit()) {
            self.errors.add(field, format!("{label} must be exactly {count} digits"));
        }
        self
    }

    /// When present, the value must be exactly `count` characters.
    pub fn exact_len_if_present(
        &mut self,
        field: &str,
        label: &str,
        value: &str,
        count: usize,
    ) -> &mut Self {
        if !value.is_empty() && value.chars().count() != count {
            self.errors.add(field, format!("{label} must be exactly {count} characters"));
        }
        self
    }

    /// The value must not exceed `max` characters.
    pub fn max_chars(&mut self, field: &str, label: &str, value: &str, max: usize) -> &mut Self {
        if value.chars().count() > max {
            self.errors.add(field, format!("{label} must be at most {max} characters"));
        }
        self
    }

    /// Record an error computed by the caller.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.errors.add(field, message);
        }
        self
    }

    /// Finish validation.
    ///
    /// # Errors
    ///
    /// Returns the collected errors if any check failed.
    pub fn finish(self) -> Result<(), FormErrors> {
        self.errors.into_result()
    }
}
