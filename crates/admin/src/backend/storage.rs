//! Object storage: uploads and public URLs.

use reqwest::Method;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use url::Url;

use super::{BackendClient, BackendError};

/// Options for a single upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub content_type: String,
    /// Overwrite an existing object at the same path
    pub upsert: bool,
    /// `Cache-Control: max-age` in seconds
    pub cache_control: Option<u32>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            content_type: "application/octet-stream".to_string(),
            upsert: false,
            cache_control: None,
        }
    }
}

impl BackendClient {
    /// URL for `{bucket}/{path}` under `prefix`, with each segment encoded.
    fn object_url(&self, prefix: &[&str], bucket: &str, path: &str) -> Result<Url, BackendError> {
        let mut url = Url::parse(self.base_url())
            .map_err(|e| BackendError::Config(format!("Invalid backend URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| BackendError::Config("backend URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["storage", "v1", "object"])
            .extend(prefix)
            .push(bucket)
            .extend(path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    /// Upload `bytes` to `path` inside `bucket`.
    ///
    /// Returns the object path within the bucket.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the storage API rejects it.
    pub async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<String, BackendError> {
        let url = self.object_url(&[], bucket, path)?;
        let mut request = self
            .request(Method::POST, url.as_str())
            .await
            .header(CONTENT_TYPE, &options.content_type)
            .header("x-upsert", if options.upsert { "true" } else { "false" });
        if let Some(max_age) = options.cache_control {
            request = request.header(CACHE_CONTROL, format!("max-age={max_age}"));
        }

        let response = request.body(bytes).send().await?;
        Self::handle_empty(response).await?;
        Ok(path.to_string())
    }

    /// Public URL of an object in a public bucket.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Config` if the base URL cannot carry a path.
    pub fn public_object_url(&self, bucket: &str, path: &str) -> Result<String, BackendError> {
        self.object_url(&["public"], bucket, path).map(String::from)
    }
}
