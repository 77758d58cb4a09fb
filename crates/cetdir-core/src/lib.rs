//! cetdir core - verification engine for the CET community directory.
//!
//! Persona and organization records go through an admin verification
//! lifecycle: self-service submissions are approved or rejected, admin-created
//! placeholders receive an invitation that the real owner claims.
//!
//! # Architecture
//!
//! - [`state`]: verification states, request kinds and category taxonomies
//! - [`record`]: records, partial updates and the acting admin
//! - [`workflow`]: the state machine over the collaborators
//! - [`bucket`]: display buckets of the admin lists
//! - [`collaborators`]: record store, invitation sender and file storage
//! - [`runtime`]: id-based entry points wiring config and collaborators
//! - [`config`]: configuration loaded from `.cetdir/config.toml`
//! - [`error`]: error type and result alias
//!
//! # Example
//!
//! ```
//! use cetdir_core::collaborators::Collaborators;
//! use cetdir_core::{AdminContext, AdminRuntime, CetdirConfig, EntityKind, NewRecord};
//! use std::path::PathBuf;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> cetdir_core::Result<()> {
//! let (collaborators, _store, sender, _storage) = Collaborators::mocked();
//! let runtime = AdminRuntime::with_collaborators(
//!     CetdirConfig::new(PathBuf::from("/srv/cetdir")),
//!     collaborators,
//! );
//!
//! let record = runtime
//!     .create(NewRecord::admin_placeholder(EntityKind::Persona, "Ana Pérez"))
//!     .await?;
//! runtime
//!     .add_contact_and_invite(&record.id, "ana@cet.edu.ar", &AdminContext::now("admin-1"))
//!     .await?;
//!
//! let buckets = runtime.list_buckets(EntityKind::Persona).await?;
//! assert_eq!(buckets.sin_reclamar.len(), 1);
//! assert_eq!(sender.sent().len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod bucket;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod record;
pub mod runtime;
pub mod state;
pub mod workflow;

pub use bucket::{Bucket, BucketedRecords, bucket_of};
pub use config::{CetdirConfig, InvitationConfig, PolicyConfig, StorageConfig, WorkflowPolicy};
pub use error::{CetdirError, Result};
pub use record::{AdminContext, AdminId, NewRecord, RecordId, RecordPatch, VerifiableRecord};
pub use runtime::{AdminRuntime, Transition};
pub use state::{EntityKind, OrganizationKind, PersonaCategory, RequestKind, VerificationState};
pub use workflow::{TransitionOutcome, VerificationWorkflow};
