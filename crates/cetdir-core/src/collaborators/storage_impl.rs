//! Local directory file storage.

use crate::collaborators::storage::{FileStorage, ProgressFn, sanitize_file_name, validate_location};
use crate::config::CetdirConfig;
use crate::error::{CetdirError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

const CHUNK_SIZE: usize = 64 * 1024;

/// File storage writing objects under a root directory, one subdirectory
/// per bucket.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalFileStorage {
    pub fn new(root: PathBuf, public_base_url: impl Into<String>) -> Self {
        Self {
            root,
            public_base_url: public_base_url.into(),
        }
    }

    pub fn from_config(config: &CetdirConfig) -> Self {
        Self::new(
            config.storage_dir.clone(),
            config.storage.public_base_url.clone(),
        )
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn upload_file_to_any_bucket(
        &self,
        file: &[u8],
        file_name: &str,
        bucket: &str,
        folder: &str,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<String> {
        validate_location(bucket, folder)?;
        let folder = folder.trim_matches('/');
        let object = format!(
            "{}-{}",
            uuid::Uuid::new_v4().simple(),
            sanitize_file_name(file_name)
        );

        let mut dir = self.root.join(bucket);
        if !folder.is_empty() {
            dir = dir.join(folder);
        }
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| CetdirError::Storage(format!("failed to create {}: {}", dir.display(), e)))?;

        let path = dir.join(&object);
        let mut out = tokio::fs::File::create(&path)
            .await
            .map_err(|e| CetdirError::Storage(format!("failed to create {}: {}", path.display(), e)))?;

        let total = file.len().max(1);
        let mut written = 0;
        for chunk in file.chunks(CHUNK_SIZE) {
            out.write_all(chunk)
                .await
                .map_err(|e| CetdirError::Storage(format!("upload failed: {}", e)))?;
            written += chunk.len();
            if let Some(progress) = on_progress {
                progress(((written * 100) / total) as u8);
            }
        }
        out.flush()
            .await
            .map_err(|e| CetdirError::Storage(format!("upload failed: {}", e)))?;
        if let Some(progress) = on_progress
            && file.is_empty()
        {
            progress(100);
        }

        let mut url = format!("{}/{}", self.public_base_url.trim_end_matches('/'), bucket);
        if !folder.is_empty() {
            url.push('/');
            url.push_str(folder);
        }
        url.push('/');
        url.push_str(&object);

        tracing::debug!(path = %path.display(), bytes = file.len(), "file stored");
        Ok(url)
    }
}
