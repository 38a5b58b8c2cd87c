use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use thiserror::Error;

use crate::config::StorageConfig;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid object key: {0}")]
    InvalidKey(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Object storage boundary. Uploads never flow through this service; clients
/// PUT directly against the presigned URL.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Presign a PUT for `key` constrained to `content_type`.
    async fn presign_upload(&self, key: &str, content_type: &str) -> Result<String, StorageError>;
}

pub type StorageState = Arc<dyn StorageService>;

/// S3-compatible client (AWS, MinIO). Path-style addressing keeps MinIO and
/// other gateway-style endpoints working.
pub struct S3Storage {
    client: s3::Client,
    bucket: String,
    presign_expiry: Duration,
}

impl S3Storage {
    pub fn new(config: &StorageConfig) -> Self {
        let credentials = s3::config::Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "static",
        );

        let s3_config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(&config.endpoint)
            .region(s3::config::Region::new(config.region.clone()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            presign_expiry: Duration::from_secs(config.presign_expiry_secs),
        }
    }
}

#[async_trait]
impl StorageService for S3Storage {
    async fn presign_upload(&self, key: &str, content_type: &str) -> Result<String, StorageError> {
        let key = sanitize_key(key)?;

        let presigning = PresigningConfig::expires_in(self.presign_expiry)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(request.uri().to_string())
    }
}

/// Strip empty and directory-navigation segments so user-supplied names
/// cannot escape their prefix.
pub fn sanitize_key(key: &str) -> Result<String, StorageError> {
    let cleaned = key
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/");

    if cleaned.is_empty() {
        return Err(StorageError::InvalidKey(key.to_string()));
    }

    Ok(cleaned)
}

/// Deterministic stand-in for tests; no network involved.
pub struct MockStorage {
    pub should_fail: bool,
}

impl MockStorage {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn failing() -> Self {
        Self { should_fail: true }
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageService for MockStorage {
    async fn presign_upload(&self, key: &str, _content_type: &str) -> Result<String, StorageError> {
        if self.should_fail {
            return Err(StorageError::Backend("simulated failure".to_string()));
        }

        let key = sanitize_key(key)?;
        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            key
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_traversal_segments() {
        assert_eq!(
            sanitize_key("org/../../etc/passwd").unwrap(),
            "org/etc/passwd"
        );
        assert_eq!(sanitize_key("a//b/./c").unwrap(), "a/b/c");
        assert!(sanitize_key("..").is_err());
        assert!(sanitize_key("").is_err());
    }

    #[tokio::test]
    async fn mock_presigns_deterministically() {
        let storage = MockStorage::new();
        let url = storage.presign_upload("org-1/logo.png", "image/png").await.unwrap();
        assert_eq!(
            url,
            "http://localhost:9000/mock-bucket/org-1/logo.png?signature=fake"
        );
    }

    #[tokio::test]
    async fn mock_failure_mode_surfaces_backend_errors() {
        let storage = MockStorage::failing();
        assert!(storage
            .presign_upload("org-1/logo.png", "image/png")
            .await
            .is_err());
    }
}
