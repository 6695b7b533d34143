//! Image uploads to backend storage.

use async_trait::async_trait;
use chrono::Utc;
use mockall::automock;

use crate::backend::{BackendClient, BackendError, UploadOptions};

/// A file received from a multipart form.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// File name safe to use as one storage path segment.
    #[must_use]
    pub fn safe_file_name(&self) -> String {
        let name: String = self
            .file_name
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
            .collect();
        let name = name.trim();
        if name.is_empty() { "image".to_string() } else { name.to_string() }
    }

    /// Extension of the file name, lowercased; `png` when there is none.
    #[must_use]
    pub fn extension(&self) -> String {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.trim().to_lowercase())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| "png".to_string())
    }
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Milliseconds since the Unix epoch, used to make object names unique.
#[must_use]
pub fn unix_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Object storage used for product images and logos.
#[automock]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Upload and return the object path within the bucket.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<String, BackendError>;

    fn public_url(&self, bucket: &str, path: &str) -> Result<String, BackendError>;
}

#[async_trait]
impl ImageStore for BackendClient {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<String, BackendError> {
        self.upload_object(bucket, path, bytes, options).await
    }

    fn public_url(&self, bucket: &str, path: &str) -> Result<String, BackendError> {
        self.public_object_url(bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str) -> ImageUpload {
        ImageUpload {
            file_name: name.to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    #[test]
    fn test_safe_file_name() {
        assert_eq!(upload("front view.jpg").safe_file_name(), "front view.jpg");
        assert_eq!(upload("../etc/passwd").safe_file_name(), "..-etc-passwd");
        assert_eq!(upload("  ").safe_file_name(), "image");
    }

    #[test]
    fn test_extension() {
        assert_eq!(upload("logo.SVG").extension(), "svg");
        assert_eq!(upload("logo").extension(), "png");
        assert_eq!(upload("logo.").extension(), "png");
    }

    #[test]
    fn test_debug_omits_bytes() {
        assert!(format!("{:?}", upload("a.png")).contains("len: 4"));
    }
}
