//! Integration tests for the persona verification flow.
//!
//! Drives the workflow against the mock collaborators, including failures
//! injected into the store and the sender.

use cetdir_core::collaborators::notifier_mock::MockInvitationSender;
use cetdir_core::collaborators::store::RecordStore;
use cetdir_core::collaborators::store_mock::MockRecordStore;
use cetdir_core::{
    AdminContext, CetdirError, EntityKind, NewRecord, PolicyConfig, RequestKind,
    VerificationState, VerificationWorkflow,
};
use chrono::{DateTime, Duration, Utc};

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-10-16T09:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn admin1(at: DateTime<Utc>) -> AdminContext {
    AdminContext::at("admin1", at)
}

#[tokio::test]
async fn test_add_contact_and_invite_from_placeholder() {
    let store = MockRecordStore::new();
    let sender = MockInvitationSender::new();
    let policy = PolicyConfig::default();
    let workflow = VerificationWorkflow::new(&store, &sender, &policy);

    let mut record = store
        .create(NewRecord::admin_placeholder(EntityKind::Persona, "Ana Pérez"))
        .await
        .unwrap();

    let outcome = workflow
        .add_contact_and_invite(&mut record, "a@b.com", &admin1(t0()))
        .await
        .unwrap();

    assert_eq!(outcome.from, VerificationState::SinInvitacion);
    assert_eq!(record.state, VerificationState::InvitacionEnviada);
    assert_eq!(record.email.as_deref(), Some("a@b.com"));
    assert_eq!(record.last_invited_at, Some(t0()));
    assert_eq!(record.request_kind, RequestKind::InvitacionAdmin);

    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].email, "a@b.com");
    assert_eq!(sent[0].admin_uid.0, "admin1");
    assert_eq!(outcome.invitation.unwrap().token, "tok-1");
}

#[tokio::test]
async fn test_add_contact_twice_is_refused() {
    let store = MockRecordStore::new();
    let sender = MockInvitationSender::new();
    let policy = PolicyConfig::default();
    let workflow = VerificationWorkflow::new(&store, &sender, &policy);

    let mut record = store
        .create(NewRecord::admin_placeholder(EntityKind::Persona, "Ana"))
        .await
        .unwrap();
    record.email = Some("old@cet.edu.ar".to_string());

    let err = workflow
        .add_contact_and_invite(&mut record, "a@b.com", &admin1(t0()))
        .await
        .unwrap_err();
    assert!(matches!(err, CetdirError::EmailAlreadyPresent(_)));
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_approve_then_reject_is_refused() {
    let store = MockRecordStore::new();
    let sender = MockInvitationSender::new();
    let policy = PolicyConfig::default();
    let workflow = VerificationWorkflow::new(&store, &sender, &policy);

    let mut record = store
        .create(NewRecord::submission(EntityKind::Persona, "Ana", None))
        .await
        .unwrap();

    workflow
        .approve_category_change(&mut record, "estudiante_cet", &admin1(t0()))
        .await
        .unwrap();
    assert_eq!(record.state, VerificationState::Verificada);
    assert_eq!(record.category.as_deref(), Some("estudiante_cet"));

    let err = workflow.reject(&mut record, &admin1(t0())).await.unwrap_err();
    assert!(matches!(err, CetdirError::InvalidStateTransition { .. }));
    assert_eq!(record.state, VerificationState::Verificada);
}

#[tokio::test]
async fn test_reject_pending_keeps_category() {
    let store = MockRecordStore::new();
    let sender = MockInvitationSender::new();
    let policy = PolicyConfig::default();
    let workflow = VerificationWorkflow::new(&store, &sender, &policy);

    let mut new = NewRecord::submission(EntityKind::Persona, "Ana", None);
    new.category = Some("ex_alumno_cet".to_string());
    let mut record = store.create(new).await.unwrap();

    let outcome = workflow.reject(&mut record, &admin1(t0())).await.unwrap();

    assert_eq!(outcome.to, VerificationState::Rechazada);
    assert_eq!(record.category.as_deref(), Some("ex_alumno_cet"));
    assert_eq!(record.admin_reviewed_at, Some(t0()));
    assert!(sender.sent().is_empty());
}

#[tokio::test]
async fn test_persona_approval_does_not_auto_invite() {
    let store = MockRecordStore::new();
    let sender = MockInvitationSender::new();
    let policy = PolicyConfig::default();
    let workflow = VerificationWorkflow::new(&store, &sender, &policy);

    let mut record = store
        .create(NewRecord::submission(
            EntityKind::Persona,
            "Ana",
            Some("ana@cet.edu.ar".to_string()),
        ))
        .await
        .unwrap();

    let outcome = workflow
        .approve_category_change(&mut record, "docente_cet", &admin1(t0()))
        .await
        .unwrap();

    assert!(outcome.invitation.is_none());
    assert!(record.last_invited_at.is_none());
    assert!(sender.sent().is_empty());
}

#[tokio::test]
async fn test_send_then_resend_only_moves_invitation_date() {
    let store = MockRecordStore::new();
    let sender = MockInvitationSender::new();
    let policy = PolicyConfig::default();
    let workflow = VerificationWorkflow::new(&store, &sender, &policy);

    let mut record = store
        .create(NewRecord::admin_placeholder(EntityKind::Persona, "Ana"))
        .await
        .unwrap();
    workflow
        .add_contact_and_invite(&mut record, "ana@cet.edu.ar", &admin1(t0()))
        .await
        .unwrap();
    let before = record.clone();

    let later = t0() + Duration::hours(1);
    workflow
        .send_invitation(&mut record, &admin1(later))
        .await
        .unwrap();
    workflow
        .resend_invitation(&mut record, &admin1(later + Duration::hours(1)))
        .await
        .unwrap();

    assert_eq!(record.state, VerificationState::InvitacionEnviada);
    assert_eq!(record.last_invited_at, Some(later + Duration::hours(1)));
    assert_eq!(record.email, before.email);
    assert_eq!(record.category, before.category);
    assert_eq!(record.reviewed_by, before.reviewed_by);
    assert_eq!(sender.sent().len(), 3);
}

#[tokio::test]
async fn test_store_failure_leaves_record_unchanged() {
    let store = MockRecordStore::new();
    let sender = MockInvitationSender::new();
    let policy = PolicyConfig::default();
    let workflow = VerificationWorkflow::new(&store, &sender, &policy);

    let mut record = store
        .create(NewRecord::submission(
            EntityKind::Persona,
            "Ana",
            Some("ana@cet.edu.ar".to_string()),
        ))
        .await
        .unwrap();
    record.request_kind = RequestKind::InvitacionAdmin;
    record.state = VerificationState::SinInvitacion;
    let before = record.clone();

    store.fail_with("network down");
    let err = workflow
        .send_invitation(&mut record, &admin1(t0()))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "network down");
    assert_eq!(record, before);
    assert!(record.last_invited_at.is_none());
    assert!(sender.sent().is_empty());
}

#[tokio::test]
async fn test_sender_failure_keeps_persisted_fields() {
    let store = MockRecordStore::new();
    let sender = MockInvitationSender::new();
    let policy = PolicyConfig::default();
    let workflow = VerificationWorkflow::new(&store, &sender, &policy);

    let mut record = store
        .create(NewRecord::admin_placeholder(EntityKind::Persona, "Ana"))
        .await
        .unwrap();

    sender.fail_with("smtp unreachable");
    let err = workflow
        .add_contact_and_invite(&mut record, "ana@cet.edu.ar", &admin1(t0()))
        .await
        .unwrap_err();

    match err {
        CetdirError::InvitationDispatchFailed { record: id, message } => {
            assert_eq!(id, record.id);
            assert_eq!(message, "smtp unreachable");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(record.state, VerificationState::InvitacionEnviada);
    assert_eq!(record.email.as_deref(), Some("ana@cet.edu.ar"));
    assert_eq!(store.snapshot(&record.id).unwrap().state, record.state);

    sender.recover();
    let outcome = workflow
        .resend_invitation(&mut record, &admin1(t0() + Duration::minutes(5)))
        .await
        .unwrap();
    assert!(outcome.invitation.is_some());
}

#[tokio::test]
async fn test_every_transition_updates_store_once() {
    let store = MockRecordStore::new();
    let sender = MockInvitationSender::new();
    let policy = PolicyConfig::default();
    let workflow = VerificationWorkflow::new(&store, &sender, &policy);

    let mut record = store
        .create(NewRecord::admin_placeholder(EntityKind::Persona, "Ana"))
        .await
        .unwrap();

    workflow
        .add_contact_and_invite(&mut record, "ana@cet.edu.ar", &admin1(t0()))
        .await
        .unwrap();
    assert_eq!(store.update_calls(), 1);

    workflow
        .resend_invitation(&mut record, &admin1(t0()))
        .await
        .unwrap();
    assert_eq!(store.update_calls(), 2);
}
