//! JSON file record store.
//!
//! Stores every record in a single JSON array. Meant for local operation of
//! the admin tool; the hosted database takes this role in production.

use crate::collaborators::store::RecordStore;
use crate::error::{CetdirError, Result};
use crate::record::{AdminContext, NewRecord, RecordId, RecordPatch, VerifiableRecord};
use crate::state::EntityKind;
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Record store backed by one JSON file.
///
/// Writes go to a sibling temp file and are renamed into place. The mutex
/// serializes read-modify-write cycles within the process.
#[derive(Debug)]
pub struct JsonRecordStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonRecordStore {
    /// Creates a store over `path`. The file is created on first write.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<VerifiableRecord>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                CetdirError::Store(format!("corrupted record file {}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(CetdirError::Store(format!(
                "failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn save(&self, records: &[VerifiableRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await.map_err(|e| {
            CetdirError::Store(format!("failed to write {}: {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            CetdirError::Store(format!("failed to replace {}: {}", self.path.display(), e))
        })?;

        Ok(())
    }

    async fn modify(
        &self,
        id: &RecordId,
        change: impl FnOnce(&mut VerifiableRecord) + Send,
    ) -> Result<VerifiableRecord> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;

        let record = records
            .iter_mut()
            .find(|record| &record.id == id)
            .ok_or_else(|| CetdirError::RecordNotFound(id.clone()))?;
        change(record);
        record.updated_at = Some(Utc::now());
        let updated = record.clone();

        self.save(&records).await?;
        tracing::debug!(record = %id, file = %self.path.display(), "record updated");

        Ok(updated)
    }
}

#[async_trait]
impl RecordStore for JsonRecordStore {
    async fn get(&self, id: &RecordId) -> Result<VerifiableRecord> {
        let _guard = self.lock.lock().await;
        self.load()
            .await?
            .into_iter()
            .find(|record| &record.id == id)
            .ok_or_else(|| CetdirError::RecordNotFound(id.clone()))
    }

    async fn list(&self, entity: EntityKind) -> Result<Vec<VerifiableRecord>> {
        let _guard = self.lock.lock().await;
        let mut records: Vec<_> = self
            .load()
            .await?
            .into_iter()
            .filter(|record| record.entity == entity)
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }

    async fn create(&self, record: NewRecord) -> Result<VerifiableRecord> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;

        let id = RecordId(uuid::Uuid::new_v4().to_string());
        let record = record.into_record(id, Utc::now());
        records.push(record.clone());
        self.save(&records).await?;

        tracing::debug!(record = %record.id, entity = %record.entity, "record created");
        Ok(record)
    }

    async fn update(&self, id: &RecordId, patch: &RecordPatch) -> Result<VerifiableRecord> {
        self.modify(id, |record| record.apply(patch)).await
    }

    async fn soft_delete(&self, id: &RecordId, actor: &AdminContext) -> Result<VerifiableRecord> {
        self.modify(id, |record| record.mark_deleted(actor)).await
    }

    async fn restore(&self, id: &RecordId) -> Result<VerifiableRecord> {
        self.modify(id, VerifiableRecord::mark_restored).await
    }
}
