//! In-memory storage backend for tests.

use crate::keys::is_valid_key;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
struct StoredEntry {
    data: Vec<u8>,
    content_type: String,
}

/// Storage backend holding objects in a map.
///
/// Counts successful writes so callers can assert how many physical objects
/// an operation produced. Writes can be made to fail to exercise error paths.
#[derive(Clone)]
pub struct MemoryStorage {
    bucket: String,
    objects: Arc<Mutex<HashMap<String, StoredEntry>>>,
    puts: Arc<AtomicUsize>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStorage {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(Mutex::new(HashMap::new())),
            puts: Arc::new(AtomicUsize::new(0)),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Number of successful `upload_with_key` calls so far.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of objects currently stored.
    pub fn object_count(&self) -> usize {
        self.lock().len()
    }

    pub fn has_object(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.lock().get(key).map(|e| e.content_type.clone())
    }

    /// Make subsequent writes fail with `UploadFailed`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredEntry>> {
        // A poisoned map only means another test thread panicked mid-write.
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_key(key: &str) -> StorageResult<()> {
        if is_valid_key(key) {
            Ok(())
        } else {
            Err(StorageError::InvalidKey(key.to_string()))
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        Self::check_key(storage_key)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed(
                "memory storage configured to fail writes".to_string(),
            ));
        }
        self.lock().insert(
            storage_key.to_string(),
            StoredEntry {
                data,
                content_type: content_type.to_string(),
            },
        );
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(format!("memory://{}/{}", self.bucket, storage_key))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        Self::check_key(storage_key)?;
        self.lock()
            .get(storage_key)
            .map(|e| e.data.clone())
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        Self::check_key(storage_key)?;
        self.lock().remove(storage_key);
        Ok(())
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        Self::check_key(storage_key)?;
        Ok(format!(
            "memory://{}/{}?expires_in={}",
            self.bucket,
            storage_key,
            expires_in.as_secs()
        ))
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counts_successful_writes_only() {
        let storage = MemoryStorage::new("share2teach");
        storage
            .upload_with_key("documents/a.pdf", b"a".to_vec(), "application/pdf")
            .await
            .unwrap();

        storage.set_fail_writes(true);
        let result = storage
            .upload_with_key("documents/b.pdf", b"b".to_vec(), "application/pdf")
            .await;
        assert!(matches!(result, Err(StorageError::UploadFailed(_))));

        assert_eq!(storage.put_count(), 1);
        assert!(storage.has_object("documents/a.pdf"));
        assert!(!storage.has_object("documents/b.pdf"));
    }

    #[tokio::test]
    async fn test_download_missing_is_not_found() {
        let storage = MemoryStorage::new("share2teach");
        assert!(matches!(
            storage.download("documents/none.pdf").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
