//! Object storage for export files.
//!
//! Two backends: a hosted bucket reached over HTTP, and a local directory.
//! Uploads never overwrite; an existing object is an error.

use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::config::ExportStorageConfig;

/// Errors from storing an export file.
#[derive(Debug, Error)]
pub enum StorageError {
    /// HTTP transport error.
    #[error("upload request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The bucket answered with a non-success status.
    #[error("upload rejected with status {status}: {body}")]
    Rejected { status: StatusCode, body: String },

    /// An object with this key already exists.
    #[error("object already exists: {0}")]
    AlreadyExists(String),

    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The storage URL or key is unusable.
    #[error("invalid object key or storage url: {0}")]
    InvalidKey(String),
}

/// Somewhere to put export files.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `body` under `key` and return the stored path.
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str)
    -> Result<String, StorageError>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Build the configured store.
///
/// # Errors
///
/// Returns `StorageError::InvalidKey` if the bucket URL cannot be parsed.
pub fn from_config(config: &ExportStorageConfig) -> Result<Box<dyn ObjectStore>, StorageError> {
    Ok(match config {
        ExportStorageConfig::Bucket { url, key, bucket } => {
            Box::new(HttpBucketStore::new(url, key.clone(), bucket)?)
        }
        ExportStorageConfig::LocalDir(dir) => Box::new(LocalDirStore::new(dir.clone())),
    })
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Hosted bucket behind a storage HTTP API.
///
/// Objects are created with `POST {base}/object/{bucket}/{key}` and a bearer
/// key; the API answers 409 for existing objects.
pub struct HttpBucketStore {
    client: reqwest::Client,
    base: Url,
    key: SecretString,
    bucket: String,
}

impl HttpBucketStore {
    /// Create a bucket store.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidKey` if `base` is not a valid URL.
    pub fn new(base: &str, key: SecretString, bucket: &str) -> Result<Self, StorageError> {
        let mut base = Url::parse(base).map_err(|e| StorageError::InvalidKey(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base,
            key,
            bucket: bucket.to_string(),
        })
    }

    fn object_url(&self, key: &str) -> Result<Url, StorageError> {
        self.base
            .join(&format!("object/{}/{key}", self.bucket))
            .map_err(|e| StorageError::InvalidKey(e.to_string()))
    }
}

#[async_trait]
impl ObjectStore for HttpBucketStore {
    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        validate_key(key)?;
        let url = self.object_url(key)?;

        let response = self
            .client
            .post(url)
            .bearer_auth(self.key.expose_secret())
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            return Err(StorageError::AlreadyExists(key.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Rejected { status, body });
        }

        Ok(format!("{}/{key}", self.bucket))
    }

    fn describe(&self) -> String {
        format!("bucket {} at {}", self.bucket, self.base)
    }
}

/// Export files on local disk.
pub struct LocalDirStore {
    dir: PathBuf,
}

impl LocalDirStore {
    #[must_use]
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl ObjectStore for LocalDirStore {
    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        use tokio::io::AsyncWriteExt;

        validate_key(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(key);

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    StorageError::AlreadyExists(key.to_string())
                } else {
                    StorageError::Io(e)
                }
            })?;
        file.write_all(&body).await?;
        file.flush().await?;

        Ok(path.display().to_string())
    }

    fn describe(&self) -> String {
        format!("directory {}", self.dir.display())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("perkshop-store-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("2024-05_orders.csv").is_ok());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("a/b.csv").is_err());
        assert!(validate_key("").is_err());
    }

    #[test]
    fn test_bucket_object_url() {
        let store = HttpBucketStore::new(
            "https://storage.example.com/storage/v1",
            SecretString::from("key"),
            "exports",
        )
        .unwrap();
        assert_eq!(
            store.object_url("2024-05_orders.csv").unwrap().as_str(),
            "https://storage.example.com/storage/v1/object/exports/2024-05_orders.csv"
        );
    }

    #[tokio::test]
    async fn test_local_store_writes_once() {
        let dir = temp_dir();
        let store = LocalDirStore::new(dir.clone());

        let path = store
            .put("2024-05_orders.csv", b"id\n".to_vec(), "text/csv")
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "id\n");

        let again = store
            .put("2024-05_orders.csv", b"other\n".to_vec(), "text/csv")
            .await;
        assert!(matches!(again, Err(StorageError::AlreadyExists(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "id\n");

        std::fs::remove_dir_all(dir).unwrap();
    }
}
