//! Verifiable records shared by personas and organizations.

use crate::state::{EntityKind, RequestKind, VerificationState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque record identifier, assigned by the store at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an admin account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdminId(pub String);

impl fmt::Display for AdminId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The acting admin and the instant of the action.
///
/// Passed explicitly to every transition so the workflow never reads
/// identity or clock from ambient state.
#[derive(Debug, Clone)]
pub struct AdminContext {
    /// Admin account performing the action.
    pub uid: AdminId,

    /// Name shown in invitation messages.
    pub display_name: Option<String>,

    /// Timestamp stamped on the record.
    pub at: DateTime<Utc>,
}

impl AdminContext {
    /// Creates a context for `uid` acting now.
    pub fn now(uid: impl Into<String>) -> Self {
        Self::at(uid, Utc::now())
    }

    /// Creates a context for `uid` acting at `at`.
    pub fn at(uid: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            uid: AdminId(uid.into()),
            display_name: None,
            at,
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// A persona or organization record that goes through verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiableRecord {
    pub id: RecordId,
    pub entity: EntityKind,
    pub display_name: String,
    pub request_kind: RequestKind,
    pub state: VerificationState,

    /// Contact address; required before an invitation can be sent.
    pub email: Option<String>,

    /// Persona main category or organization type, set on approval.
    pub category: Option<String>,

    /// Stamped on each (re)send.
    pub last_invited_at: Option<DateTime<Utc>>,

    /// Stamped on approval or rejection.
    pub admin_reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<AdminId>,

    /// Account that claimed the record through an invitation.
    pub claimed_by: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<AdminId>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A stored combination of fields that breaks a record invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityViolation {
    /// `invitacion_admin` record without email that was invited or verified.
    AdminInviteWithoutEmail(VerificationState),

    /// `invitacion_enviada` with no `last_invited_at`.
    InvitedWithoutTimestamp,
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityViolation::AdminInviteWithoutEmail(state) => write!(
                f,
                "invitacion_admin record without email is in state {}",
                state
            ),
            IntegrityViolation::InvitedWithoutTimestamp => {
                write!(f, "invitacion_enviada record without last invitation date")
            }
        }
    }
}

impl VerifiableRecord {
    /// Checks the stored invariants of the record.
    pub fn check_integrity(&self) -> std::result::Result<(), IntegrityViolation> {
        if self.request_kind == RequestKind::InvitacionAdmin
            && self.email.is_none()
            && matches!(
                self.state,
                VerificationState::InvitacionEnviada | VerificationState::Verificada
            )
        {
            return Err(IntegrityViolation::AdminInviteWithoutEmail(self.state));
        }

        if self.state == VerificationState::InvitacionEnviada && self.last_invited_at.is_none() {
            return Err(IntegrityViolation::InvitedWithoutTimestamp);
        }

        Ok(())
    }

    /// Flags the record as deleted by `actor`.
    pub fn mark_deleted(&mut self, actor: &AdminContext) {
        self.is_deleted = true;
        self.deleted_at = Some(actor.at);
        self.deleted_by = Some(actor.uid.clone());
    }

    /// Clears the deletion flags.
    pub fn mark_restored(&mut self) {
        self.is_deleted = false;
        self.deleted_at = None;
        self.deleted_by = None;
    }

    /// Applies the set fields of `patch`.
    pub fn apply(&mut self, patch: &RecordPatch) {
        if let Some(state) = patch.state {
            self.state = state;
        }
        if let Some(kind) = patch.request_kind {
            self.request_kind = kind;
        }
        if let Some(email) = &patch.email {
            self.email = Some(email.clone());
        }
        if let Some(category) = &patch.category {
            self.category = Some(category.clone());
        }
        if let Some(at) = patch.last_invited_at {
            self.last_invited_at = Some(at);
        }
        if let Some(at) = patch.admin_reviewed_at {
            self.admin_reviewed_at = Some(at);
        }
        if let Some(admin) = &patch.reviewed_by {
            self.reviewed_by = Some(admin.clone());
        }
        if let Some(account) = &patch.claimed_by {
            self.claimed_by = Some(account.clone());
        }
        if let Some(at) = patch.claimed_at {
            self.claimed_at = Some(at);
        }
    }
}

/// Partial update sent to the record store.
///
/// Workflow transitions only ever set fields, so `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<VerificationState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_kind: Option<RequestKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_invited_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<AdminId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<DateTime<Utc>>,
}

impl RecordPatch {
    /// Patch moving the record to `state`.
    pub fn transition(state: VerificationState) -> Self {
        Self {
            state: Some(state),
            ..Default::default()
        }
    }

    /// Stamps review fields from `admin`.
    #[must_use]
    pub fn reviewed(mut self, admin: &AdminContext) -> Self {
        self.admin_reviewed_at = Some(admin.at);
        self.reviewed_by = Some(admin.uid.clone());
        self
    }

    /// Stamps the invitation date from `admin`.
    #[must_use]
    pub fn invited(mut self, admin: &AdminContext) -> Self {
        self.last_invited_at = Some(admin.at);
        self
    }
}

/// Fields of a record about to be created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub entity: EntityKind,
    pub display_name: String,
    pub request_kind: RequestKind,
    pub state: VerificationState,
    pub email: Option<String>,
    pub category: Option<String>,
}

impl NewRecord {
    /// Self-service submission awaiting approval.
    pub fn submission(
        entity: EntityKind,
        display_name: impl Into<String>,
        email: Option<String>,
    ) -> Self {
        Self {
            entity,
            display_name: display_name.into(),
            request_kind: RequestKind::CambioCategoria,
            state: VerificationState::PendienteAprobacion,
            email,
            category: None,
        }
    }

    /// Admin-created placeholder without contact information.
    pub fn admin_placeholder(entity: EntityKind, display_name: impl Into<String>) -> Self {
        Self {
            entity,
            display_name: display_name.into(),
            request_kind: RequestKind::InvitacionAdmin,
            state: VerificationState::SinInvitacion,
            email: None,
            category: None,
        }
    }

    /// Materializes the record with the id and timestamp chosen by a store.
    pub fn into_record(self, id: RecordId, created_at: DateTime<Utc>) -> VerifiableRecord {
        VerifiableRecord {
            id,
            entity: self.entity,
            display_name: self.display_name,
            request_kind: self.request_kind,
            state: self.state,
            email: self.email,
            category: self.category,
            last_invited_at: None,
            admin_reviewed_at: None,
            reviewed_by: None,
            claimed_by: None,
            claimed_at: None,
            is_deleted: false,
            deleted_at: None,
            deleted_by: None,
            created_at,
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholder() -> VerifiableRecord {
        NewRecord::admin_placeholder(EntityKind::Persona, "Ana Pérez")
            .into_record(RecordId::new("p-1"), Utc::now())
    }

    #[test]
    fn test_should_create_placeholder_without_invitation() {
        let record = placeholder();
        assert_eq!(record.state, VerificationState::SinInvitacion);
        assert_eq!(record.request_kind, RequestKind::InvitacionAdmin);
        assert!(record.email.is_none());
        assert!(record.check_integrity().is_ok());
    }

    #[test]
    fn test_should_create_submission_pending_approval() {
        let record = NewRecord::submission(
            EntityKind::Organizacion,
            "Taller Sur",
            Some("hola@tallersur.ar".to_string()),
        )
        .into_record(RecordId::new("o-1"), Utc::now());
        assert_eq!(record.state, VerificationState::PendienteAprobacion);
        assert_eq!(record.request_kind, RequestKind::CambioCategoria);
    }

    #[test]
    fn test_integrity_flags_admin_invite_without_email() {
        let mut record = placeholder();
        record.state = VerificationState::Verificada;

        assert_eq!(
            record.check_integrity(),
            Err(IntegrityViolation::AdminInviteWithoutEmail(
                VerificationState::Verificada
            ))
        );
    }

    #[test]
    fn test_integrity_allows_rejected_placeholder_without_email() {
        let mut record = placeholder();
        record.state = VerificationState::Rechazada;

        assert!(record.check_integrity().is_ok());
    }

    #[test]
    fn test_apply_only_touches_set_fields() {
        let mut record = placeholder();
        let admin = AdminContext::now("admin-1");
        let patch = RecordPatch::transition(VerificationState::InvitacionEnviada).invited(&admin);

        record.apply(&RecordPatch {
            email: Some("a@b.com".to_string()),
            ..patch
        });

        assert_eq!(record.state, VerificationState::InvitacionEnviada);
        assert_eq!(record.email.as_deref(), Some("a@b.com"));
        assert_eq!(record.last_invited_at, Some(admin.at));
        assert!(record.reviewed_by.is_none());
        assert_eq!(record.display_name, "Ana Pérez");
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let json = serde_json::to_value(RecordPatch::transition(VerificationState::Rechazada))
            .unwrap();
        assert_eq!(json, serde_json::json!({ "state": "rechazada" }));
    }
}
