//! Record store trait.
//!
//! The record store is the persistence collaborator of the workflow: the
//! hosted database in production, a JSON file or an in-memory map locally.

use crate::error::Result;
use crate::record::{AdminContext, NewRecord, RecordId, RecordPatch, VerifiableRecord};
use crate::state::EntityKind;
use async_trait::async_trait;

/// Persistence collaborator for verifiable records.
///
/// Every method is one request/response round trip. Implementations must
/// not retry on their own.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetches a record by id, including soft-deleted ones.
    ///
    /// # Errors
    ///
    /// Returns `CetdirError::RecordNotFound` if no record has this id, or
    /// `CetdirError::Store` if the backend fails.
    async fn get(&self, id: &RecordId) -> Result<VerifiableRecord>;

    /// Lists every record of `entity`, including soft-deleted ones.
    ///
    /// # Errors
    ///
    /// Returns `CetdirError::Store` if the backend fails.
    async fn list(&self, entity: EntityKind) -> Result<Vec<VerifiableRecord>>;

    /// Creates a record and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `CetdirError::Store` if the backend fails.
    async fn create(&self, record: NewRecord) -> Result<VerifiableRecord>;

    /// Applies a partial update and returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns `CetdirError::RecordNotFound` if no record has this id, or
    /// `CetdirError::Store` if the backend fails.
    async fn update(&self, id: &RecordId, patch: &RecordPatch) -> Result<VerifiableRecord>;

    /// Flags a record as deleted by `actor`.
    ///
    /// # Errors
    ///
    /// Same as [`RecordStore::update`].
    async fn soft_delete(&self, id: &RecordId, actor: &AdminContext) -> Result<VerifiableRecord>;

    /// Clears the deleted flag of a record.
    ///
    /// # Errors
    ///
    /// Same as [`RecordStore::update`].
    async fn restore(&self, id: &RecordId) -> Result<VerifiableRecord>;
}
