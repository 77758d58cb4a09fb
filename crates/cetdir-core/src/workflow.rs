//! Verification workflow.
//!
//! Moves persona and organization records through the verification
//! lifecycle. Every transition validates its preconditions locally, then
//! performs one record store update and, for invitations, one sender call.
//!
//! A store failure leaves the caller's record untouched. A sender failure
//! after a successful store update is reported as
//! [`CetdirError::InvitationDispatchFailed`] with the persisted fields
//! already applied to the record, so the caller can offer a resend.

use crate::collaborators::notifier::{InvitationReceipt, InvitationRequest, InvitationSender};
use crate::collaborators::store::RecordStore;
use crate::config::PolicyConfig;
use crate::error::{CetdirError, Result};
use crate::record::{AdminContext, RecordPatch, VerifiableRecord};
use crate::state::{EntityKind, RequestKind, VerificationState};
use chrono::{DateTime, Utc};
use validator::ValidateEmail;

/// What a successful transition did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    /// State before the transition.
    pub from: VerificationState,

    /// State after the transition.
    pub to: VerificationState,

    /// Receipt of the invitation dispatched as part of the transition.
    pub invitation: Option<InvitationReceipt>,
}

/// The verification state machine over a record store and an invitation
/// sender.
///
/// # Examples
///
/// ```
/// use cetdir_core::collaborators::notifier_mock::MockInvitationSender;
/// use cetdir_core::collaborators::store::RecordStore;
/// use cetdir_core::collaborators::store_mock::MockRecordStore;
/// use cetdir_core::{AdminContext, EntityKind, NewRecord, PolicyConfig, VerificationState, VerificationWorkflow};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> cetdir_core::Result<()> {
/// let store = MockRecordStore::new();
/// let sender = MockInvitationSender::new();
/// let policy = PolicyConfig::default();
/// let workflow = VerificationWorkflow::new(&store, &sender, &policy);
///
/// let mut record = store
///     .create(NewRecord::admin_placeholder(EntityKind::Persona, "Ana Pérez"))
///     .await?;
/// workflow
///     .add_contact_and_invite(&mut record, "ana@cet.edu.ar", &AdminContext::now("admin-1"))
///     .await?;
/// assert_eq!(record.state, VerificationState::InvitacionEnviada);
/// # Ok(())
/// # }
/// ```
pub struct VerificationWorkflow<'a> {
    store: &'a dyn RecordStore,
    sender: &'a dyn InvitationSender,
    policy: &'a PolicyConfig,
}

impl<'a> VerificationWorkflow<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        sender: &'a dyn InvitationSender,
        policy: &'a PolicyConfig,
    ) -> Self {
        Self {
            store,
            sender,
            policy,
        }
    }

    /// Approves a self-service category change and assigns the category.
    ///
    /// Personas take a [`crate::PersonaCategory`], organizations an
    /// [`crate::OrganizationKind`]. If the entity's policy auto-invites on
    /// approval and the record has an email, an invitation is sent too.
    ///
    /// # Errors
    ///
    /// - `MissingCategory` if `category` is blank
    /// - `InvalidStateTransition` unless the record is `pendiente_aprobacion`
    /// - `WrongRequestKind` unless the request is `cambio_categoria`
    /// - `InvalidCategory` if the category is not in the entity's taxonomy
    /// - collaborator errors, see the module docs
    #[tracing::instrument(skip_all, fields(record = %record.id, admin = %admin.uid))]
    pub async fn approve_category_change(
        &self,
        record: &mut VerifiableRecord,
        category: &str,
        admin: &AdminContext,
    ) -> Result<TransitionOutcome> {
        if category.trim().is_empty() {
            return Err(CetdirError::MissingCategory);
        }
        require_state(
            record,
            "approve category change for",
            &[VerificationState::PendienteAprobacion],
        )?;
        if record.request_kind != RequestKind::CambioCategoria {
            return Err(CetdirError::WrongRequestKind {
                operation: "approve category change for",
                kind: record.request_kind,
            });
        }
        let category = record.entity.parse_category(category).ok_or_else(|| {
            CetdirError::InvalidCategory {
                entity: record.entity,
                category: category.trim().to_string(),
            }
        })?;

        let invite = self.invites_on_approval(record);
        let mut patch = RecordPatch::transition(VerificationState::Verificada).reviewed(admin);
        patch.category = Some(category.to_string());
        if invite {
            patch = patch.invited(admin);
        }

        self.commit(record, patch, invite, admin).await
    }

    /// Approves an organization without reassigning its type.
    ///
    /// # Errors
    ///
    /// - `WrongEntity` for personas
    /// - `InvalidStateTransition` unless the record is `pendiente_aprobacion`
    /// - collaborator errors, see the module docs
    #[tracing::instrument(skip_all, fields(record = %record.id, admin = %admin.uid))]
    pub async fn approve_organization(
        &self,
        record: &mut VerifiableRecord,
        admin: &AdminContext,
    ) -> Result<TransitionOutcome> {
        if record.entity != EntityKind::Organizacion {
            return Err(CetdirError::WrongEntity {
                operation: "approve organization for",
                entity: record.entity,
            });
        }
        require_state(
            record,
            "approve",
            &[VerificationState::PendienteAprobacion],
        )?;

        let invite = self.invites_on_approval(record);
        let mut patch = RecordPatch::transition(VerificationState::Verificada).reviewed(admin);
        if invite {
            patch = patch.invited(admin);
        }

        self.commit(record, patch, invite, admin).await
    }

    /// Rejects a record.
    ///
    /// Allowed from `pendiente_aprobacion`; entities whose policy has
    /// `reject_before_approval` can also be rejected from `sin_invitacion`
    /// and `invitacion_enviada`. The category is left untouched.
    ///
    /// # Errors
    ///
    /// `InvalidStateTransition` from any other state, or a store error.
    #[tracing::instrument(skip_all, fields(record = %record.id, admin = %admin.uid))]
    pub async fn reject(
        &self,
        record: &mut VerifiableRecord,
        admin: &AdminContext,
    ) -> Result<TransitionOutcome> {
        let allowed: &[VerificationState] =
            if self.policy.for_entity(record.entity).reject_before_approval {
                &[
                    VerificationState::PendienteAprobacion,
                    VerificationState::SinInvitacion,
                    VerificationState::InvitacionEnviada,
                ]
            } else {
                &[VerificationState::PendienteAprobacion]
            };
        require_state(record, "reject", allowed)?;

        let patch = RecordPatch::transition(VerificationState::Rechazada).reviewed(admin);
        self.commit(record, patch, false, admin).await
    }

    /// Adds the contact address to an admin placeholder and invites it.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless the record is `sin_invitacion`
    /// - `EmailAlreadyPresent` if the record already has an email
    /// - `InvalidEmail` if `email` is malformed
    /// - collaborator errors, see the module docs
    #[tracing::instrument(skip_all, fields(record = %record.id, admin = %admin.uid))]
    pub async fn add_contact_and_invite(
        &self,
        record: &mut VerifiableRecord,
        email: &str,
        admin: &AdminContext,
    ) -> Result<TransitionOutcome> {
        require_state(
            record,
            "add contact to",
            &[VerificationState::SinInvitacion],
        )?;
        if record.email.is_some() {
            return Err(CetdirError::EmailAlreadyPresent(record.id.clone()));
        }
        let email = email.trim();
        if !email.validate_email() {
            return Err(CetdirError::InvalidEmail(email.to_string()));
        }

        let mut patch = RecordPatch::transition(VerificationState::InvitacionEnviada).invited(admin);
        patch.email = Some(email.to_string());
        patch.request_kind = Some(RequestKind::InvitacionAdmin);

        self.commit(record, patch, true, admin).await
    }

    /// Sends an invitation to the record's email.
    ///
    /// Approved records that were never claimed can be invited too; they
    /// stay `verificada`.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless the record is `sin_invitacion`,
    ///   `invitacion_enviada` or an unclaimed `verificada`
    /// - `MissingEmail` if the record has no email
    /// - collaborator errors, see the module docs
    #[tracing::instrument(skip_all, fields(record = %record.id, admin = %admin.uid))]
    pub async fn send_invitation(
        &self,
        record: &mut VerifiableRecord,
        admin: &AdminContext,
    ) -> Result<TransitionOutcome> {
        require_invitable(
            record,
            "send invitation for",
            &[
                VerificationState::SinInvitacion,
                VerificationState::InvitacionEnviada,
            ],
        )?;
        self.invite(record, admin).await
    }

    /// Sends a new invitation, superseding the previous token whether or not
    /// it has expired.
    ///
    /// # Errors
    ///
    /// Same as [`Self::send_invitation`], but only `invitacion_enviada` and
    /// unclaimed `verificada` records are accepted.
    #[tracing::instrument(skip_all, fields(record = %record.id, admin = %admin.uid))]
    pub async fn resend_invitation(
        &self,
        record: &mut VerifiableRecord,
        admin: &AdminContext,
    ) -> Result<TransitionOutcome> {
        require_invitable(
            record,
            "resend invitation for",
            &[VerificationState::InvitacionEnviada],
        )?;
        self.invite(record, admin).await
    }

    /// Links the record to the account presenting an invitation token.
    ///
    /// Claimable records are `invitacion_enviada` ones and organizations
    /// approved with an invitation (`verificada`, not yet claimed).
    ///
    /// # Errors
    ///
    /// - `InvitationAlreadyClaimed` if the record was claimed before
    /// - `InvalidStateTransition` from any other state
    /// - `InvalidInvitationToken`, `InvitationSuperseded`,
    ///   `InvitationExpired` for unusable tokens
    /// - collaborator errors
    #[tracing::instrument(skip_all, fields(record = %record.id, claimer = claimer_account_id))]
    pub async fn claim(
        &self,
        record: &mut VerifiableRecord,
        claimer_account_id: &str,
        token: &str,
        at: DateTime<Utc>,
    ) -> Result<TransitionOutcome> {
        if record.claimed_by.is_some() {
            return Err(CetdirError::InvitationAlreadyClaimed);
        }
        require_state(
            record,
            "claim",
            &[
                VerificationState::InvitacionEnviada,
                VerificationState::Verificada,
            ],
        )?;

        let issued = self
            .sender
            .lookup_token(token)
            .await?
            .ok_or(CetdirError::InvalidInvitationToken)?;
        issued.check_claimable(&record.id, at)?;

        let mut patch = RecordPatch::transition(VerificationState::Verificada);
        patch.claimed_by = Some(claimer_account_id.to_string());
        patch.claimed_at = Some(at);

        let from = record.state;
        self.persist(record, &patch).await?;

        if let Err(e) = self.sender.consume_token(token, claimer_account_id, at).await {
            tracing::warn!(error = %e, "record claimed but token could not be marked as used");
        }

        tracing::info!(from = %from, "record claimed");
        Ok(TransitionOutcome {
            from,
            to: record.state,
            invitation: None,
        })
    }

    async fn invite(
        &self,
        record: &mut VerifiableRecord,
        admin: &AdminContext,
    ) -> Result<TransitionOutcome> {
        if record.email.is_none() {
            return Err(CetdirError::MissingEmail(record.id.clone()));
        }

        let next = match record.state {
            VerificationState::Verificada => VerificationState::Verificada,
            _ => VerificationState::InvitacionEnviada,
        };
        let patch = RecordPatch::transition(next).invited(admin);
        self.commit(record, patch, true, admin).await
    }

    fn invites_on_approval(&self, record: &VerifiableRecord) -> bool {
        self.policy
            .for_entity(record.entity)
            .auto_invite_on_approval
            && record.email.is_some()
    }

    /// Persists `patch`, then dispatches an invitation when `dispatch` is set.
    async fn commit(
        &self,
        record: &mut VerifiableRecord,
        patch: RecordPatch,
        dispatch: bool,
        admin: &AdminContext,
    ) -> Result<TransitionOutcome> {
        let from = record.state;
        self.persist(record, &patch).await?;

        let invitation = if dispatch {
            Some(self.dispatch(record, admin).await?)
        } else {
            None
        };

        tracing::info!(
            from = %from,
            to = %record.state,
            invited = invitation.is_some(),
            "verification transition completed"
        );

        Ok(TransitionOutcome {
            from,
            to: record.state,
            invitation,
        })
    }

    async fn persist(&self, record: &mut VerifiableRecord, patch: &RecordPatch) -> Result<()> {
        if let Some(next) = patch.state
            && !record.state.can_transition_to(next)
        {
            return Err(CetdirError::InvalidStateTransition {
                operation: "move",
                state: record.state,
            });
        }

        tracing::debug!(?patch, "updating record");
        let updated = self.store.update(&record.id, patch).await?;
        *record = updated;

        if let Err(violation) = record.check_integrity() {
            tracing::warn!(record = %record.id, %violation, "record stored with inconsistent fields");
        }
        Ok(())
    }

    async fn dispatch(
        &self,
        record: &VerifiableRecord,
        admin: &AdminContext,
    ) -> Result<InvitationReceipt> {
        let request = InvitationRequest::for_record(
            record,
            admin.uid.clone(),
            admin.display_name.clone(),
            admin.at,
        )
        .ok_or_else(|| CetdirError::MissingEmail(record.id.clone()))?;

        tracing::debug!(email = %request.email, "dispatching invitation");
        self.sender
            .send_invitation(&request)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "invitation dispatch failed after record update");
                CetdirError::InvitationDispatchFailed {
                    record: record.id.clone(),
                    message: e.to_string(),
                }
            })
    }
}

fn require_state(
    record: &VerifiableRecord,
    operation: &'static str,
    allowed: &[VerificationState],
) -> Result<()> {
    if record.is_deleted {
        return Err(CetdirError::RecordDeleted(record.id.clone()));
    }
    if allowed.contains(&record.state) {
        Ok(())
    } else {
        Err(CetdirError::InvalidStateTransition {
            operation,
            state: record.state,
        })
    }
}

/// Like [`require_state`], also accepting approved records nobody claimed yet.
fn require_invitable(
    record: &VerifiableRecord,
    operation: &'static str,
    allowed: &[VerificationState],
) -> Result<()> {
    if record.state == VerificationState::Verificada && !record.is_deleted {
        return match record.claimed_by {
            Some(_) => Err(CetdirError::InvitationAlreadyClaimed),
            None => Ok(()),
        };
    }
    require_state(record, operation, allowed)
}
