//! Customer list, detail, delete, and the customer form controller.

use std::sync::Arc;

use neonflake_core::CustomerId;
use neonflake_core::form::FormErrors;
use neonflake_core::normalize::FieldNormalizer;
use thiserror::Error;

use super::notifications::Notifier;
use crate::db::{CustomerRepository, RepositoryError};
use crate::models::{Customer, CustomerDraft, CustomerSummary};

/// Shown for a duplicate email, before or after the write.
pub const DUPLICATE_EMAIL_MESSAGE: &str = "A customer with this email already exists";

/// Errors from submitting the customer form.
#[derive(Debug, Error)]
pub enum CustomerFormError {
    /// Validation failed; nothing was sent.
    #[error("invalid customer: {0}")]
    Invalid(FormErrors),

    /// Another customer already uses the email.
    #[error("duplicate email")]
    DuplicateEmail,

    /// The customer being edited no longer exists.
    #[error("customer not found")]
    NotFound,

    #[error(transparent)]
    Repository(RepositoryError),
}

impl CustomerFormError {
    /// Field errors to render inline.
    #[must_use]
    pub fn field_errors(&self) -> FormErrors {
        match self {
            Self::Invalid(errors) => errors.clone(),
            Self::DuplicateEmail => {
                let mut errors = FormErrors::new();
                errors.add("email", DUPLICATE_EMAIL_MESSAGE);
                errors
            }
            Self::NotFound | Self::Repository(_) => FormErrors::new(),
        }
    }
}

/// Read and delete operations on customers.
#[derive(Clone)]
pub struct CustomerService {
    customers: Arc<dyn CustomerRepository>,
    notifier: Notifier,
}

impl CustomerService {
    #[must_use]
    pub fn new(customers: Arc<dyn CustomerRepository>, notifier: Notifier) -> Self {
        Self { customers, notifier }
    }

    /// Every customer with order aggregates.
    ///
    /// # Errors
    ///
    /// Returns the repository error after notifying.
    pub async fn list(&self) -> Result<Vec<CustomerSummary>, RepositoryError> {
        match self.customers.list_with_orders().await {
            Ok(rows) => Ok(rows.into_iter().map(CustomerSummary::from).collect()),
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch customers");
                self.notifier.error("Failed to fetch customers");
                Err(e)
            }
        }
    }

    /// One customer with order aggregates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown id.
    pub async fn get(&self, id: &CustomerId) -> Result<CustomerSummary, RepositoryError> {
        self.customers.get(id).await.map(CustomerSummary::from)
    }

    /// The raw record, for the edit form.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown id.
    pub async fn get_record(&self, id: &CustomerId) -> Result<Customer, RepositoryError> {
        self.customers.get(id).await
    }

    /// Delete by id.
    ///
    /// # Errors
    ///
    /// Returns the repository error after notifying.
    pub async fn delete(&self, id: &CustomerId) -> Result<(), RepositoryError> {
        match self.customers.delete(id).await {
            Ok(()) => {
                tracing::info!(customer_id = %id, "Customer deleted");
                self.notifier.success("Customer deleted successfully");
                Ok(())
            }
            Err(e) => {
                tracing::error!(customer_id = %id, error = %e, "Failed to delete customer");
                self.notifier.error("Failed to delete customer");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for CustomerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomerService").finish_non_exhaustive()
    }
}

/// Normalize, validate, de-duplicate, then create or update a customer.
#[derive(Clone)]
pub struct CustomerFormController {
    customers: Arc<dyn CustomerRepository>,
    notifier: Notifier,
    normalizer: FieldNormalizer,
}

impl CustomerFormController {
    #[must_use]
    pub fn new(customers: Arc<dyn CustomerRepository>, notifier: Notifier) -> Self {
        Self {
            customers,
            notifier,
            normalizer: FieldNormalizer::customer(),
        }
    }

    /// Normalize one changed field.
    #[must_use]
    pub fn normalize_field(&self, field: &str, value: &str) -> String {
        self.normalizer.apply(field, value)
    }

    /// Submit the form. Updates when `edit_target` is set, inserts otherwise.
    ///
    /// `draft` is normalized in place so a failed submission re-renders
    /// the normalized values.
    ///
    /// # Errors
    ///
    /// Returns `CustomerFormError::Invalid` without any backend call when
    /// validation fails, and `CustomerFormError::DuplicateEmail` when the
    /// email belongs to another customer.
    pub async fn submit(
        &self,
        draft: &mut CustomerDraft,
        edit_target: Option<&CustomerId>,
    ) -> Result<Customer, CustomerFormError> {
        let action = if edit_target.is_some() { "update" } else { "add" };

        draft.normalize(&self.normalizer);
        if let Err(errors) = draft.validate() {
            self.notifier.error("Please correct the highlighted fields");
            return Err(CustomerFormError::Invalid(errors));
        }

        let matches = match self.customers.find_by_email(&draft.email).await {
            Ok(matches) => matches,
            Err(e) => return Err(self.write_failed(action, e)),
        };
        if let Some(existing) = matches.iter().find(|c| Some(&c.id) != edit_target) {
            tracing::info!(existing_id = %existing.id, "Duplicate customer email rejected");
            self.notifier.error(DUPLICATE_EMAIL_MESSAGE);
            return Err(CustomerFormError::DuplicateEmail);
        }

        let result = match edit_target {
            Some(id) => self.customers.update(id, draft).await,
            None => self.customers.insert(draft).await,
        };

        match result {
            Ok(customer) => {
                tracing::info!(customer_id = %customer.id, action, "Customer saved");
                self.notifier.success(if edit_target.is_some() {
                    "Customer updated successfully"
                } else {
                    "Customer added successfully"
                });
                Ok(customer)
            }
            Err(RepositoryError::Conflict(detail)) => {
                tracing::info!(detail = %detail, "Duplicate customer email rejected by backend");
                self.notifier.error(DUPLICATE_EMAIL_MESSAGE);
                Err(CustomerFormError::DuplicateEmail)
            }
            Err(RepositoryError::NotFound) if edit_target.is_some() => {
                self.notifier.error("Customer not found");
                Err(CustomerFormError::NotFound)
            }
            Err(e) => Err(self.write_failed(action, e)),
        }
    }

    fn write_failed(&self, action: &str, error: RepositoryError) -> CustomerFormError {
        tracing::error!(error = %error, action, "Customer form submission failed");
        self.notifier.error(format!("Failed to {action} customer"));
        CustomerFormError::Repository(error)
    }
}

impl std::fmt::Debug for CustomerFormController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomerFormController")
            .field("normalizer", &self.normalizer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::db::MockCustomerRepository;
    use crate::models::tests::{customer, valid_customer_draft as valid_draft};
    use crate::services::notifications::ToastKind;
    use testresult::TestResult;

    fn notifier() -> Notifier {
        Notifier::new(Duration::from_secs(5))
    }

    fn last_toast(notifier: &Notifier) -> (String, ToastKind) {
        let toast = notifier.snapshot().pop().unwrap();
        (toast.message, toast.kind)
    }

    #[tokio::test]
    async fn test_invalid_form_never_reaches_backend() {
        let mut repo = MockCustomerRepository::new();
        repo.expect_find_by_email().never();
        repo.expect_insert().never();
        repo.expect_update().never();

        let notifier = notifier();
        let controller = CustomerFormController::new(Arc::new(repo), notifier.clone());
        let mut draft = valid_draft();
        draft.phone = "12345".into();

        let err = controller.submit(&mut draft, None).await.unwrap_err();
        assert_eq!(
            err.field_errors().get("phone"),
            Some("Phone number must be exactly 10 digits")
        );
        assert_eq!(last_toast(&notifier).1, ToastKind::Error);
    }

    #[tokio::test]
    async fn test_create_normalizes_before_insert() -> TestResult {
        let mut repo = MockCustomerRepository::new();
        repo.expect_find_by_email()
            .once()
            .withf(|email| email == "asha@example.in")
            .return_once(|_| Ok(Vec::new()));
        repo.expect_insert()
            .once()
            .withf(|d| d.phone == "9876543210" && d.gst_number == "22AAAAA0000A1Z5" && d.city == "Bengaluru")
            .return_once(|_| Ok(customer("c-new", "Asha", "Rao", "asha@example.in")));
        repo.expect_update().never();

        let notifier = notifier();
        let controller = CustomerFormController::new(Arc::new(repo), notifier.clone());
        let mut draft = valid_draft();
        draft.email = "  ASHA@Example.in ".into();
        draft.phone = "(91) 98765-43210 ext".into();
        draft.gst_number = " 22 aaaaa0000a1z5 ".into();
        draft.city = "bengaluru".into();

        let created = controller.submit(&mut draft, None).await?;
        assert_eq!(created.id.as_str(), "c-new");
        assert_eq!(
            last_toast(&notifier),
            ("Customer added successfully".to_string(), ToastKind::Success)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_email_on_other_record_rejected_before_write() {
        let mut repo = MockCustomerRepository::new();
        repo.expect_find_by_email()
            .once()
            .return_once(|_| Ok(vec![customer("c-other", "Someone", "Else", "asha@example.in")]));
        repo.expect_insert().never();
        repo.expect_update().never();

        let notifier = notifier();
        let controller = CustomerFormController::new(Arc::new(repo), notifier.clone());
        let edit = CustomerId::new("c-1");

        let err = controller.submit(&mut valid_draft(), Some(&edit)).await.unwrap_err();
        assert!(matches!(err, CustomerFormError::DuplicateEmail));
        assert_eq!(err.field_errors().get("email"), Some(DUPLICATE_EMAIL_MESSAGE));
        assert_eq!(last_toast(&notifier).0, DUPLICATE_EMAIL_MESSAGE);
    }

    #[tokio::test]
    async fn test_duplicate_email_matches_stored_case_variant() {
        let mut repo = MockCustomerRepository::new();
        repo.expect_find_by_email()
            .once()
            .withf(|email| email == "asha@example.in")
            .return_once(|_| Ok(vec![customer("c-1", "Asha", "Rao", "Asha@Example.in")]));
        repo.expect_insert().never();

        let notifier = notifier();
        let controller = CustomerFormController::new(Arc::new(repo), notifier.clone());
        let mut draft = valid_draft();
        draft.email = "asha@example.in".into();

        let err = controller.submit(&mut draft, None).await.unwrap_err();
        assert!(matches!(err, CustomerFormError::DuplicateEmail));
        assert_eq!(last_toast(&notifier).0, DUPLICATE_EMAIL_MESSAGE);
    }

    #[tokio::test]
    async fn test_editing_own_email_updates() -> TestResult {
        let mut repo = MockCustomerRepository::new();
        repo.expect_find_by_email()
            .once()
            .return_once(|_| Ok(vec![customer("c-1", "Asha", "Rao", "asha@example.in")]));
        repo.expect_update()
            .once()
            .withf(|id, draft| id.as_str() == "c-1" && draft.phone == "9123456780")
            .return_once(|_, _| Ok(customer("c-1", "Asha", "Rao", "asha@example.in")));
        repo.expect_insert().never();

        let notifier = notifier();
        let controller = CustomerFormController::new(Arc::new(repo), notifier.clone());
        let mut draft = valid_draft();
        draft.phone = "91234 56780".into();

        controller.submit(&mut draft, Some(&CustomerId::new("c-1"))).await?;
        assert_eq!(last_toast(&notifier).0, "Customer updated successfully");
        Ok(())
    }

    #[tokio::test]
    async fn test_unique_violation_falls_back_to_duplicate_error() {
        let mut repo = MockCustomerRepository::new();
        repo.expect_find_by_email().once().return_once(|_| Ok(Vec::new()));
        repo.expect_insert()
            .once()
            .return_once(|_| Err(RepositoryError::Conflict("customers_email_key".into())));

        let controller = CustomerFormController::new(Arc::new(repo), notifier());
        let err = controller.submit(&mut valid_draft(), None).await.unwrap_err();
        assert!(matches!(err, CustomerFormError::DuplicateEmail));
    }

    #[tokio::test]
    async fn test_backend_failure_notifies_generic_message() {
        let mut repo = MockCustomerRepository::new();
        repo.expect_find_by_email().once().return_once(|_| Ok(Vec::new()));
        repo.expect_insert().once().return_once(|_| {
            Err(RepositoryError::Backend(crate::backend::BackendError::Parse("boom".into())))
        });

        let notifier = notifier();
        let controller = CustomerFormController::new(Arc::new(repo), notifier.clone());
        let err = controller.submit(&mut valid_draft(), None).await.unwrap_err();
        assert!(matches!(err, CustomerFormError::Repository(_)));
        assert_eq!(last_toast(&notifier).0, "Failed to add customer");
    }

    #[tokio::test]
    async fn test_delete_notifies() {
        let mut repo = MockCustomerRepository::new();
        repo.expect_delete()
            .once()
            .withf(|id| id.as_str() == "c-9")
            .return_once(|_| Ok(()));

        let notifier = notifier();
        let service = CustomerService::new(Arc::new(repo), notifier.clone());
        service.delete(&CustomerId::new("c-9")).await.unwrap();
        assert_eq!(last_toast(&notifier).0, "Customer deleted successfully");
    }

    #[tokio::test]
    async fn test_list_failure_notifies() {
        let mut repo = MockCustomerRepository::new();
        repo.expect_list_with_orders()
            .once()
            .return_once(|| Err(RepositoryError::NotFound));

        let notifier = notifier();
        let service = CustomerService::new(Arc::new(repo), notifier.clone());
        assert!(service.list().await.is_err());
        assert_eq!(last_toast(&notifier).0, "Failed to fetch customers");
    }
}
