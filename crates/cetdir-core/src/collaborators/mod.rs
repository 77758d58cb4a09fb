//! External collaborators of the verification workflow.
//!
//! Each collaborator is a trait with a local file-backed implementation
//! (`*_impl`) and an in-memory implementation for tests (`*_mock`):
//!
//! - [`store`]: persistence of verifiable records
//! - [`notifier`]: invitation tokens and dispatch
//! - [`storage`]: file uploads for avatars, logos and attachments

pub mod notifier;
pub mod notifier_impl;
pub mod notifier_mock;
pub mod storage;
pub mod storage_impl;
pub mod storage_mock;
pub mod store;
pub mod store_impl;
pub mod store_mock;

/// Registry owning one instance of each collaborator.
///
/// Collaborators are trait objects so the runtime can run against the local
/// backends or against mocks.
pub struct Collaborators {
    /// Record persistence.
    pub store: Box<dyn store::RecordStore>,

    /// Invitation tokens and dispatch.
    pub sender: Box<dyn notifier::InvitationSender>,

    /// File uploads.
    pub storage: Box<dyn storage::FileStorage>,
}

impl Collaborators {
    pub fn new(
        store: Box<dyn store::RecordStore>,
        sender: Box<dyn notifier::InvitationSender>,
        storage: Box<dyn storage::FileStorage>,
    ) -> Self {
        Self {
            store,
            sender,
            storage,
        }
    }

    /// Registry backed by in-memory mocks. Returns handles sharing state with
    /// the boxed instances.
    pub fn mocked() -> (
        Self,
        store_mock::MockRecordStore,
        notifier_mock::MockInvitationSender,
        storage_mock::MockFileStorage,
    ) {
        let store = store_mock::MockRecordStore::new();
        let sender = notifier_mock::MockInvitationSender::new();
        let storage = storage_mock::MockFileStorage::new();
        (
            Self::new(
                Box::new(store.clone()),
                Box::new(sender.clone()),
                Box::new(storage.clone()),
            ),
            store,
            sender,
            storage,
        )
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("store", &"Box<dyn RecordStore>")
            .field("sender", &"Box<dyn InvitationSender>")
            .field("storage", &"Box<dyn FileStorage>")
            .finish()
    }
}
