//! Error types for cetdir operations.
//!
//! Errors fall into three groups: validation and precondition failures that
//! are detected before any collaborator is called, collaborator failures that
//! are surfaced verbatim to the caller, and ambient IO/config failures.

use crate::record::RecordId;
use crate::state::{EntityKind, RequestKind, VerificationState};
use std::path::PathBuf;
use thiserror::Error;

/// Error types for directory verification operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CetdirError {
    // Validation errors
    /// No category was selected for an approval.
    #[error("no category selected")]
    MissingCategory,

    /// The category is not part of the entity's taxonomy.
    #[error("invalid category for {entity}: {category}")]
    InvalidCategory {
        /// Entity the category was checked against.
        entity: EntityKind,
        /// The rejected category.
        category: String,
    },

    /// Email address is malformed.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// The record has no email, so no invitation can be sent.
    #[error("record {0} has no email address")]
    MissingEmail(RecordId),

    /// The record already carries contact information.
    #[error("record {0} already has an email address")]
    EmailAlreadyPresent(RecordId),

    // Precondition errors
    /// Operation not allowed from the record's current state.
    #[error("cannot {operation} a record in state {state}")]
    InvalidStateTransition {
        /// Name of the attempted operation.
        operation: &'static str,
        /// State the record was in.
        state: VerificationState,
    },

    /// Operation requires a different request kind.
    #[error("cannot {operation} a record with request kind {kind}")]
    WrongRequestKind {
        /// Name of the attempted operation.
        operation: &'static str,
        /// Request kind the record had.
        kind: RequestKind,
    },

    /// Operation is only defined for another entity.
    #[error("cannot {operation} a {entity} record")]
    WrongEntity {
        /// Name of the attempted operation.
        operation: &'static str,
        /// Entity of the record.
        entity: EntityKind,
    },

    /// Record is soft-deleted; restore it before running transitions.
    #[error("record {0} is deleted")]
    RecordDeleted(RecordId),

    // Claim errors
    /// Token unknown, or issued for another record.
    #[error("invalid invitation token")]
    InvalidInvitationToken,

    /// Token is past its expiry.
    #[error("invitation expired")]
    InvitationExpired,

    /// A newer invitation replaced this token.
    #[error("invitation was superseded by a newer one")]
    InvitationSuperseded,

    /// Token or record already claimed.
    #[error("invitation already claimed")]
    InvitationAlreadyClaimed,

    // Collaborator errors
    /// Record not found in the store.
    #[error("record not found: {0}")]
    RecordNotFound(RecordId),

    /// Record store reported a failure.
    #[error("{0}")]
    Store(String),

    /// Invitation sender reported a failure.
    #[error("{0}")]
    Notification(String),

    /// File storage reported a failure.
    #[error("{0}")]
    Storage(String),

    /// The record was updated but the invitation could not be dispatched.
    ///
    /// The persisted fields are already applied; callers should offer a resend.
    #[error("record {record} updated but invitation dispatch failed: {message}")]
    InvitationDispatchFailed {
        /// Record whose invitation failed.
        record: RecordId,
        /// Message reported by the sender.
        message: String,
    },

    // Config errors
    /// Error parsing the configuration file.
    #[error("config parse error: {0}")]
    ConfigParseError(String),

    /// Configuration values are inconsistent.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read.
    #[error("config file unreadable: {0}")]
    ConfigUnreadable(PathBuf),

    // IO and system errors
    /// Standard IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error in a file-backed collaborator.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invitation rendering failed.
    #[error("mail error: {0}")]
    Mail(#[from] cetdir_mail::MailError),

    /// Generic error with context from anyhow.
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl CetdirError {
    /// True for errors detected before any collaborator was called.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CetdirError::MissingCategory
                | CetdirError::InvalidCategory { .. }
                | CetdirError::InvalidEmail(_)
                | CetdirError::MissingEmail(_)
                | CetdirError::EmailAlreadyPresent(_)
                | CetdirError::InvalidStateTransition { .. }
                | CetdirError::WrongRequestKind { .. }
                | CetdirError::WrongEntity { .. }
                | CetdirError::RecordDeleted(_)
        )
    }
}

/// Result type alias for cetdir operations.
pub type Result<T> = std::result::Result<T, CetdirError>;
