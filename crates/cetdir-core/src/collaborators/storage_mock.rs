//! Mock file storage for testing.

use crate::collaborators::storage::{FileStorage, ProgressFn, sanitize_file_name, validate_location};
use crate::error::{CetdirError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory file storage. URLs look like `mock://bucket/folder/name`.
#[derive(Debug, Clone, Default)]
pub struct MockFileStorage {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl MockFileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes uploads fail with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(message.into());
    }

    /// Returns the bytes stored under `url`.
    pub fn get(&self, url: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(url).cloned()
    }
}

#[async_trait]
impl FileStorage for MockFileStorage {
    async fn upload_file_to_any_bucket(
        &self,
        file: &[u8],
        file_name: &str,
        bucket: &str,
        folder: &str,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<String> {
        if let Some(message) = self.failure.lock().unwrap().as_ref() {
            return Err(CetdirError::Storage(message.clone()));
        }
        validate_location(bucket, folder)?;

        let folder = folder.trim_matches('/');
        let url = if folder.is_empty() {
            format!("mock://{}/{}", bucket, sanitize_file_name(file_name))
        } else {
            format!("mock://{}/{}/{}", bucket, folder, sanitize_file_name(file_name))
        };
        self.objects.lock().unwrap().insert(url.clone(), file.to_vec());
        if let Some(progress) = on_progress {
            progress(100);
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_storage_roundtrip() {
        let storage = MockFileStorage::new();
        let url = storage
            .upload_file_to_any_bucket(b"img", "avatar.jpg", "avatars", "personas", None)
            .await
            .unwrap();

        assert_eq!(url, "mock://avatars/personas/avatar.jpg");
        assert_eq!(storage.get(&url).unwrap(), b"img");
    }
}
