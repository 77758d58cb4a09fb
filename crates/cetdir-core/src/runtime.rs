//! Admin runtime.
//!
//! This module provides [`AdminRuntime`], the entry point used by admin
//! surfaces. It owns the configuration and the collaborators, and exposes
//! every workflow transition by record id.

use crate::bucket::BucketedRecords;
use crate::collaborators::Collaborators;
use crate::collaborators::notifier_impl::OutboxInvitationSender;
use crate::collaborators::storage::ProgressFn;
use crate::collaborators::storage_impl::LocalFileStorage;
use crate::collaborators::store_impl::JsonRecordStore;
use crate::config::CetdirConfig;
use crate::error::{CetdirError, Result};
use crate::record::{AdminContext, NewRecord, RecordId, VerifiableRecord};
use crate::state::EntityKind;
use crate::workflow::{TransitionOutcome, VerificationWorkflow};
use chrono::{DateTime, Utc};
use validator::ValidateEmail;

/// Result of a transition run by id: the stored record and what changed.
pub type Transition = (VerifiableRecord, TransitionOutcome);

/// Runtime for admin verification actions.
///
/// # Examples
///
/// ```no_run
/// use cetdir_core::{AdminContext, AdminRuntime, CetdirConfig, EntityKind};
/// use std::path::PathBuf;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = CetdirConfig::load(PathBuf::from("/srv/cetdir"))?;
/// let runtime = AdminRuntime::new(config)?;
///
/// let buckets = runtime.list_buckets(EntityKind::Persona).await?;
/// for record in &buckets.sin_invitar {
///     println!("{} ({})", record.display_name, record.id);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AdminRuntime {
    /// Runtime configuration.
    pub config: CetdirConfig,

    /// Record store, invitation sender and file storage.
    pub collaborators: Collaborators,
}

impl AdminRuntime {
    /// Creates a runtime backed by the local file collaborators.
    ///
    /// # Errors
    ///
    /// Returns `CetdirError::Mail` if the invitation templates cannot be
    /// loaded.
    pub fn new(config: CetdirConfig) -> Result<Self> {
        let collaborators = Collaborators::new(
            Box::new(JsonRecordStore::new(config.data_file.clone())),
            Box::new(OutboxInvitationSender::from_config(&config)?),
            Box::new(LocalFileStorage::from_config(&config)),
        );

        Ok(Self::with_collaborators(config, collaborators))
    }

    /// Creates a runtime over the given collaborators.
    pub fn with_collaborators(config: CetdirConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
        }
    }

    /// Workflow bound to this runtime's collaborators and policy.
    pub fn workflow(&self) -> VerificationWorkflow<'_> {
        VerificationWorkflow::new(
            &*self.collaborators.store,
            &*self.collaborators.sender,
            &self.config.policy,
        )
    }

    /// Lists the records of `entity` split into display buckets.
    pub async fn list_buckets(&self, entity: EntityKind) -> Result<BucketedRecords> {
        let records = self.collaborators.store.list(entity).await?;
        Ok(BucketedRecords::partition(records))
    }

    pub async fn get(&self, id: &RecordId) -> Result<VerifiableRecord> {
        self.collaborators.store.get(id).await
    }

    /// Creates a record.
    ///
    /// # Errors
    ///
    /// Returns `CetdirError::InvalidEmail` if an email is given and
    /// malformed, or a store error.
    pub async fn create(&self, record: NewRecord) -> Result<VerifiableRecord> {
        if let Some(email) = &record.email
            && !email.validate_email()
        {
            return Err(CetdirError::InvalidEmail(email.clone()));
        }

        let created = self.collaborators.store.create(record).await?;
        tracing::info!(
            record = %created.id,
            entity = %created.entity,
            state = %created.state,
            "record created"
        );
        Ok(created)
    }

    pub async fn approve_category_change(
        &self,
        id: &RecordId,
        category: &str,
        admin: &AdminContext,
    ) -> Result<Transition> {
        let mut record = self.get(id).await?;
        let outcome = self
            .workflow()
            .approve_category_change(&mut record, category, admin)
            .await?;
        Ok((record, outcome))
    }

    pub async fn approve_organization(
        &self,
        id: &RecordId,
        admin: &AdminContext,
    ) -> Result<Transition> {
        let mut record = self.get(id).await?;
        let outcome = self
            .workflow()
            .approve_organization(&mut record, admin)
            .await?;
        Ok((record, outcome))
    }

    pub async fn reject(&self, id: &RecordId, admin: &AdminContext) -> Result<Transition> {
        let mut record = self.get(id).await?;
        let outcome = self.workflow().reject(&mut record, admin).await?;
        Ok((record, outcome))
    }

    pub async fn add_contact_and_invite(
        &self,
        id: &RecordId,
        email: &str,
        admin: &AdminContext,
    ) -> Result<Transition> {
        let mut record = self.get(id).await?;
        let outcome = self
            .workflow()
            .add_contact_and_invite(&mut record, email, admin)
            .await?;
        Ok((record, outcome))
    }

    pub async fn send_invitation(
        &self,
        id: &RecordId,
        admin: &AdminContext,
    ) -> Result<Transition> {
        let mut record = self.get(id).await?;
        let outcome = self.workflow().send_invitation(&mut record, admin).await?;
        Ok((record, outcome))
    }

    pub async fn resend_invitation(
        &self,
        id: &RecordId,
        admin: &AdminContext,
    ) -> Result<Transition> {
        let mut record = self.get(id).await?;
        let outcome = self
            .workflow()
            .resend_invitation(&mut record, admin)
            .await?;
        Ok((record, outcome))
    }

    pub async fn claim(
        &self,
        id: &RecordId,
        claimer_account_id: &str,
        token: &str,
        at: DateTime<Utc>,
    ) -> Result<Transition> {
        let mut record = self.get(id).await?;
        let outcome = self
            .workflow()
            .claim(&mut record, claimer_account_id, token, at)
            .await?;
        Ok((record, outcome))
    }

    /// Soft-deletes a record. Deleted records disappear from every bucket.
    pub async fn soft_delete(
        &self,
        id: &RecordId,
        actor: &AdminContext,
    ) -> Result<VerifiableRecord> {
        let record = self.collaborators.store.soft_delete(id, actor).await?;
        tracing::info!(record = %id, admin = %actor.uid, "record deleted");
        Ok(record)
    }

    /// Clears the deletion flags of a record.
    pub async fn restore(&self, id: &RecordId) -> Result<VerifiableRecord> {
        let record = self.collaborators.store.restore(id).await?;
        tracing::info!(record = %id, "record restored");
        Ok(record)
    }

    /// Uploads a file and returns its public URL.
    pub async fn upload(
        &self,
        file: &[u8],
        file_name: &str,
        bucket: &str,
        folder: &str,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<String> {
        self.collaborators
            .storage
            .upload_file_to_any_bucket(file, file_name, bucket, folder, on_progress)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::VerificationState;
    use tempfile::TempDir;

    fn mocked_runtime() -> (
        AdminRuntime,
        crate::collaborators::store_mock::MockRecordStore,
        crate::collaborators::notifier_mock::MockInvitationSender,
    ) {
        let (collaborators, store, sender, _storage) = Collaborators::mocked();
        let runtime = AdminRuntime::with_collaborators(
            CetdirConfig::new(std::path::PathBuf::from("/tmp/cetdir-test")),
            collaborators,
        );
        (runtime, store, sender)
    }

    #[test]
    fn test_new_runtime() {
        let temp_dir = TempDir::new().unwrap();
        let config = CetdirConfig::new(temp_dir.path().to_path_buf());

        let runtime = AdminRuntime::new(config);
        assert!(runtime.is_ok());
    }

    #[tokio::test]
    async fn test_create_rejects_malformed_email() {
        let (runtime, _store, _sender) = mocked_runtime();

        let err = runtime
            .create(NewRecord::submission(
                EntityKind::Persona,
                "Ana",
                Some("ana@".to_string()),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, CetdirError::InvalidEmail(_)));
    }

    #[tokio::test]
    async fn test_transition_by_id_returns_stored_record() {
        let (runtime, store, sender) = mocked_runtime();
        let created = runtime
            .create(NewRecord::admin_placeholder(EntityKind::Persona, "Ana"))
            .await
            .unwrap();

        let (record, outcome) = runtime
            .add_contact_and_invite(&created.id, "ana@cet.edu.ar", &AdminContext::now("admin-1"))
            .await
            .unwrap();

        assert_eq!(outcome.to, VerificationState::InvitacionEnviada);
        assert_eq!(store.snapshot(&created.id), Some(record));
        assert_eq!(sender.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let (runtime, _store, _sender) = mocked_runtime();

        let err = runtime
            .reject(&RecordId::new("persona-99"), &AdminContext::now("admin-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, CetdirError::RecordNotFound(_)));
    }

    #[tokio::test]
    async fn test_deleted_record_refuses_transitions() {
        let (runtime, _store, sender) = mocked_runtime();
        let admin = AdminContext::now("admin-1");
        let created = runtime
            .create(NewRecord::admin_placeholder(EntityKind::Persona, "Ana"))
            .await
            .unwrap();
        runtime.soft_delete(&created.id, &admin).await.unwrap();

        let err = runtime
            .add_contact_and_invite(&created.id, "ana@cet.edu.ar", &admin)
            .await
            .unwrap_err();
        assert!(matches!(err, CetdirError::RecordDeleted(_)));
        assert!(sender.sent().is_empty());

        runtime.restore(&created.id).await.unwrap();
        let (record, _) = runtime
            .add_contact_and_invite(&created.id, "ana@cet.edu.ar", &admin)
            .await
            .unwrap();
        assert_eq!(record.state, VerificationState::InvitacionEnviada);
    }
}
