//! Product list, delete, and the product form controller.

use std::sync::Arc;

use futures::future::try_join_all;
use neonflake_core::ProductId;
use neonflake_core::form::FormErrors;
use thiserror::Error;

use super::images::{ImageStore, ImageUpload, unix_millis};
use super::notifications::Notifier;
use crate::backend::{BackendError, UploadOptions};
use crate::db::{ProductRepository, RepositoryError};
use crate::models::{PRODUCT_IMAGE_SLOTS, Product, ProductDraft};

/// Storage bucket for product images.
pub const PRODUCT_IMAGES_BUCKET: &str = "product-images";

#[derive(Debug, Error)]
pub enum ProductFormError {
    /// Validation failed; nothing was uploaded or written.
    #[error("invalid product: {0}")]
    Invalid(FormErrors),

    /// An image upload failed; the product was not created.
    #[error("image upload failed: {0}")]
    Upload(BackendError),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl ProductFormError {
    #[must_use]
    pub fn field_errors(&self) -> FormErrors {
        match self {
            Self::Invalid(errors) => errors.clone(),
            Self::Upload(_) | Self::Repository(_) => FormErrors::new(),
        }
    }
}

/// Product operations, including the create form.
#[derive(Clone)]
pub struct ProductFormController {
    products: Arc<dyn ProductRepository>,
    images: Arc<dyn ImageStore>,
    notifier: Notifier,
}

impl ProductFormController {
    #[must_use]
    pub fn new(products: Arc<dyn ProductRepository>, images: Arc<dyn ImageStore>, notifier: Notifier) -> Self {
        Self {
            products,
            images,
            notifier,
        }
    }

    /// Every product, newest first.
    ///
    /// # Errors
    ///
    /// Returns the repository error after notifying.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        self.products.list().await.inspect_err(|e| {
            tracing::error!(error = %e, "Failed to fetch products");
            self.notifier.error("Failed to fetch products");
        })
    }

    /// Validate, upload every image concurrently, then insert the product.
    ///
    /// `images` holds the form's image slots in order; the first slot is
    /// required. If any upload fails nothing is inserted, and images that
    /// did upload are left in the bucket.
    ///
    /// # Errors
    ///
    /// Returns `ProductFormError::Invalid` before any upload when the form
    /// is invalid.
    pub async fn submit(
        &self,
        draft: &ProductDraft,
        images: Vec<Option<ImageUpload>>,
    ) -> Result<Product, ProductFormError> {
        let validated = draft.validate();
        let mut errors = validated.as_ref().err().cloned().unwrap_or_default();
        if images.first().and_then(Option::as_ref).is_none() {
            errors.add("images", "Product image is required");
        }
        if images.len() > PRODUCT_IMAGE_SLOTS {
            errors.add("images", "At most 4 images can be uploaded");
        }
        let product = match validated {
            Ok(product) if errors.is_empty() => product,
            _ => {
                self.notifier.error("Please correct the highlighted fields");
                return Err(ProductFormError::Invalid(errors));
            }
        };

        let stamp = unix_millis();
        let uploads = images
            .into_iter()
            .enumerate()
            .filter_map(|(slot, image)| image.map(|image| (slot, image)))
            .map(|(slot, image)| {
                let path = format!("{stamp}-{slot}-{}", image.safe_file_name());
                let options = UploadOptions {
                    content_type: image.content_type.clone(),
                    ..UploadOptions::default()
                };
                let images = Arc::clone(&self.images);
                async move {
                    images
                        .upload(PRODUCT_IMAGES_BUCKET, &path, image.bytes, &options)
                        .await
                }
            });

        let paths = match try_join_all(uploads).await {
            Ok(paths) => paths,
            Err(e) => {
                tracing::error!(error = %e, "Product image upload failed");
                self.notifier.error("Failed to add product");
                return Err(ProductFormError::Upload(e));
            }
        };

        match self.products.insert(&product, &paths).await {
            Ok(created) => {
                tracing::info!(product_id = %created.id, images = paths.len(), "Product created");
                self.notifier.success("Product added successfully");
                Ok(created)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to insert product");
                self.notifier.error("Failed to add product");
                Err(ProductFormError::Repository(e))
            }
        }
    }

    /// Delete by id.
    ///
    /// # Errors
    ///
    /// Returns the repository error after notifying.
    pub async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        match self.products.delete(id).await {
            Ok(()) => {
                self.notifier.success("Product deleted successfully");
                Ok(())
            }
            Err(e) => {
                tracing::error!(product_id = %id, error = %e, "Failed to delete product");
                self.notifier.error("Failed to delete product");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for ProductFormController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductFormController").finish_non_exhaustive()
    }
}
