//! Object storage collaborator used for image attachments.
//!
//! The backend is external; [`ObjectStorage`] is the whole contract the editor
//! relies on. [`MemoryStorage`] backs tests.

use std::future::Future;
use std::path::Path;

use bytes::Bytes;
use dashmap::DashMap;
use rand::Rng;
use rand::distr::Alphanumeric;

use crate::config::StorageConfig;
use crate::error::StorageError;

/// Length of the random part of generated object names.
const RANDOM_SUFFIX_LEN: usize = 7;

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// Path of the object inside the bucket.
    pub path: String,
    /// URL the object can be fetched from without credentials.
    pub public_url: String,
}

/// Storage backend contract.
pub trait ObjectStorage {
    /// Store `data` under `path`.
    fn upload(
        &self,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Public URL for an object path. Does not check that the object exists.
    fn public_url(&self, path: &str) -> String;
}

/// Upload under a freshly generated unique name and resolve its public URL.
pub async fn upload_with_unique_name<S: ObjectStorage>(
    storage: &S,
    original_name: &str,
    data: Bytes,
    content_type: &str,
) -> Result<UploadResult, StorageError> {
    let path = unique_object_name(original_name);
    tracing::debug!(upload_path = %path, size = data.len(), content_type, "uploading object");
    storage.upload(&path, data, content_type).await?;
    let public_url = storage.public_url(&path);
    Ok(UploadResult { path, public_url })
}

/// `{unix_millis}_{random}.{ext}`, keeping the original file's extension.
///
/// Names without an extension get no suffix.
pub fn unique_object_name(original_name: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(RANDOM_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();

    match Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(ext) if !ext.is_empty() => format!("{millis}_{suffix}.{ext}"),
        _ => format!("{millis}_{suffix}"),
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

/// In-process storage. Never fails unless the path already exists.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    config: StorageConfig,
    objects: DashMap<String, StoredObject>,
}

impl MemoryStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            objects: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectStorage for MemoryStorage {
    async fn upload(&self, path: &str, data: Bytes, content_type: &str) -> Result<(), StorageError> {
        if self.objects.contains_key(path) {
            return Err(StorageError::Rejected {
                path: path.to_owned(),
                message: "The resource already exists".to_owned(),
            });
        }
        self.objects.insert(
            path.to_owned(),
            StoredObject {
                data,
                content_type: content_type.to_owned(),
            },
        );
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        self.config.public_url(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_name_keeps_extension() {
        let name = unique_object_name("screenshot.final.PNG");
        let (stem, ext) = name.rsplit_once('.').unwrap();
        assert_eq!(ext, "PNG");
        let (millis, suffix) = stem.split_once('_').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), RANDOM_SUFFIX_LEN);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn unique_name_without_extension() {
        let name = unique_object_name("README");
        assert!(!name.contains('.'));
    }

    #[test]
    fn unique_names_differ() {
        assert_ne!(unique_object_name("a.png"), unique_object_name("a.png"));
    }

    #[tokio::test]
    async fn memory_storage_upload_and_url() {
        let storage = MemoryStorage::new(StorageConfig {
            bucket: "images".to_owned(),
            public_base_url: "https://cdn.test".to_owned(),
        });
        let result =
            upload_with_unique_name(&storage, "cat.jpg", Bytes::from_static(b"\xff\xd8"), "image/jpeg")
                .await
                .unwrap();

        assert!(result.path.ends_with(".jpg"));
        assert_eq!(
            result.public_url,
            format!("https://cdn.test/images/{}", result.path)
        );
        assert_eq!(storage.objects.get(&result.path).unwrap().content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn memory_storage_rejects_duplicate_paths() {
        let storage = MemoryStorage::default();
        storage
            .upload("a.png", Bytes::from_static(b"1"), "image/png")
            .await
            .unwrap();
        let err = storage
            .upload("a.png", Bytes::from_static(b"2"), "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Rejected { .. }));
        assert_eq!(storage.len(), 1);
    }
}
