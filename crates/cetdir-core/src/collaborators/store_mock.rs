//! Mock record store for testing.
//!
//! Keeps records in an in-memory map and can be told to fail, so tests can
//! exercise the workflow's collaborator error paths.

use crate::collaborators::store::RecordStore;
use crate::error::{CetdirError, Result};
use crate::record::{AdminContext, NewRecord, RecordId, RecordPatch, VerifiableRecord};
use crate::state::EntityKind;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// In-memory record store.
///
/// Clones share the same records, so a test can keep a handle while the
/// workflow owns another.
///
/// # Examples
///
/// ```
/// use cetdir_core::collaborators::store::RecordStore;
/// use cetdir_core::collaborators::store_mock::MockRecordStore;
/// use cetdir_core::{EntityKind, NewRecord};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = MockRecordStore::new();
/// let record = store
///     .create(NewRecord::admin_placeholder(EntityKind::Persona, "Ana"))
///     .await
///     .unwrap();
/// assert_eq!(record.id.as_str(), "persona-1");
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockRecordStore {
    records: Arc<Mutex<BTreeMap<RecordId, VerifiableRecord>>>,
    next_id: Arc<Mutex<u64>>,
    failure: Arc<Mutex<Option<String>>>,
    update_calls: Arc<Mutex<usize>>,
}

impl MockRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `records`.
    pub fn with_records(records: impl IntoIterator<Item = VerifiableRecord>) -> Self {
        let store = Self::new();
        {
            let mut map = store.records.lock().unwrap();
            for record in records {
                map.insert(record.id.clone(), record);
            }
        }
        store
    }

    /// Makes every following call fail with `message` until [`Self::recover`].
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(message.into());
    }

    /// Stops injecting failures.
    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    /// Returns the stored copy of a record.
    pub fn snapshot(&self, id: &RecordId) -> Option<VerifiableRecord> {
        self.records.lock().unwrap().get(id).cloned()
    }

    /// Number of `update` calls received, failed ones included.
    pub fn update_calls(&self) -> usize {
        *self.update_calls.lock().unwrap()
    }

    fn check_failure(&self) -> Result<()> {
        match self.failure.lock().unwrap().as_ref() {
            Some(message) => Err(CetdirError::Store(message.clone())),
            None => Ok(()),
        }
    }

    fn modify(
        &self,
        id: &RecordId,
        change: impl FnOnce(&mut VerifiableRecord),
    ) -> Result<VerifiableRecord> {
        self.check_failure()?;
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(id)
            .ok_or_else(|| CetdirError::RecordNotFound(id.clone()))?;
        change(record);
        record.updated_at = Some(Utc::now());
        Ok(record.clone())
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn get(&self, id: &RecordId) -> Result<VerifiableRecord> {
        self.check_failure()?;
        self.snapshot(id)
            .ok_or_else(|| CetdirError::RecordNotFound(id.clone()))
    }

    async fn list(&self, entity: EntityKind) -> Result<Vec<VerifiableRecord>> {
        self.check_failure()?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|record| record.entity == entity)
            .cloned()
            .collect())
    }

    async fn create(&self, record: NewRecord) -> Result<VerifiableRecord> {
        self.check_failure()?;
        let id = {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            RecordId(format!("{}-{}", record.entity, *next_id))
        };

        let record = record.into_record(id.clone(), Utc::now());
        self.records.lock().unwrap().insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, id: &RecordId, patch: &RecordPatch) -> Result<VerifiableRecord> {
        *self.update_calls.lock().unwrap() += 1;
        self.modify(id, |record| record.apply(patch))
    }

    async fn soft_delete(&self, id: &RecordId, actor: &AdminContext) -> Result<VerifiableRecord> {
        self.modify(id, |record| record.mark_deleted(actor))
    }

    async fn restore(&self, id: &RecordId) -> Result<VerifiableRecord> {
        self.modify(id, VerifiableRecord::mark_restored)
    }
}
