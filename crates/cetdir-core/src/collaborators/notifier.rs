//! Invitation sender trait and token bookkeeping.
//!
//! The sender is the notification collaborator of the workflow. It owns
//! invitation tokens: generation, expiry, superseding on resend, and
//! consumption on claim.

use crate::error::{CetdirError, Result};
use crate::record::{AdminId, RecordId, VerifiableRecord};
use crate::state::EntityKind;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Everything a sender needs to invite the owner of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct InvitationRequest {
    pub record_id: RecordId,
    pub entity: EntityKind,
    pub recipient_name: String,
    pub email: String,
    pub admin_uid: AdminId,
    pub admin_display_name: Option<String>,
    pub sent_at: DateTime<Utc>,
}

impl InvitationRequest {
    /// Builds a request for `record`, or `None` if it has no email.
    pub fn for_record(
        record: &VerifiableRecord,
        admin_uid: AdminId,
        admin_display_name: Option<String>,
        sent_at: DateTime<Utc>,
    ) -> Option<Self> {
        let email = record.email.clone()?;
        Some(Self {
            record_id: record.id.clone(),
            entity: record.entity,
            recipient_name: record.display_name.clone(),
            email,
            admin_uid,
            admin_display_name,
            sent_at,
        })
    }
}

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationReceipt {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// An issued invitation token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationToken {
    pub token: String,
    pub record_id: RecordId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub superseded: bool,
    pub consumed_at: Option<DateTime<Utc>>,
    pub consumed_by: Option<String>,
}

impl InvitationToken {
    /// Checks that the token can claim `record_id` at `at`.
    ///
    /// # Errors
    ///
    /// Returns `CetdirError::InvalidInvitationToken` if the token belongs to
    /// another record, `CetdirError::InvitationAlreadyClaimed` if it was
    /// consumed, `CetdirError::InvitationSuperseded` if a newer invitation
    /// replaced it, and `CetdirError::InvitationExpired` past its expiry.
    pub fn check_claimable(&self, record_id: &RecordId, at: DateTime<Utc>) -> Result<()> {
        if &self.record_id != record_id {
            return Err(CetdirError::InvalidInvitationToken);
        }
        if self.consumed_at.is_some() {
            return Err(CetdirError::InvitationAlreadyClaimed);
        }
        if self.superseded {
            return Err(CetdirError::InvitationSuperseded);
        }
        if at >= self.expires_at {
            return Err(CetdirError::InvitationExpired);
        }
        Ok(())
    }
}

/// Token bookkeeping shared by sender implementations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenLedger {
    tokens: Vec<InvitationToken>,
}

impl TokenLedger {
    /// Records a newly issued token, superseding earlier live tokens of the
    /// same record.
    pub fn issue(
        &mut self,
        token: String,
        record_id: &RecordId,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> InvitationReceipt {
        for existing in self
            .tokens
            .iter_mut()
            .filter(|t| &t.record_id == record_id && t.consumed_at.is_none())
        {
            existing.superseded = true;
        }

        let expires_at = issued_at + ttl;
        self.tokens.push(InvitationToken {
            token: token.clone(),
            record_id: record_id.clone(),
            issued_at,
            expires_at,
            superseded: false,
            consumed_at: None,
            consumed_by: None,
        });

        InvitationReceipt { token, expires_at }
    }

    /// Finds a token by value.
    pub fn find(&self, token: &str) -> Option<&InvitationToken> {
        self.tokens.iter().find(|t| t.token == token)
    }

    /// Marks a token as consumed by `account`.
    ///
    /// # Errors
    ///
    /// Returns `CetdirError::InvalidInvitationToken` for unknown tokens and
    /// `CetdirError::InvitationAlreadyClaimed` if already consumed.
    pub fn consume(&mut self, token: &str, account: &str, at: DateTime<Utc>) -> Result<()> {
        let entry = self
            .tokens
            .iter_mut()
            .find(|t| t.token == token)
            .ok_or(CetdirError::InvalidInvitationToken)?;
        if entry.consumed_at.is_some() {
            return Err(CetdirError::InvitationAlreadyClaimed);
        }
        entry.consumed_at = Some(at);
        entry.consumed_by = Some(account.to_string());
        Ok(())
    }

    /// Tokens issued for `record_id`, oldest first.
    pub fn for_record<'a>(
        &'a self,
        record_id: &'a RecordId,
    ) -> impl Iterator<Item = &'a InvitationToken> + 'a {
        self.tokens.iter().filter(move |t| &t.record_id == record_id)
    }
}

/// Notification collaborator: issues tokens and dispatches invitations.
#[async_trait]
pub trait InvitationSender: Send + Sync {
    /// Generates a token for the record and dispatches the invitation.
    ///
    /// A new token supersedes every live token of the same record.
    ///
    /// # Errors
    ///
    /// Returns `CetdirError::Notification` if generation or dispatch fails.
    async fn send_invitation(&self, request: &InvitationRequest) -> Result<InvitationReceipt>;

    /// Looks up an issued token.
    ///
    /// # Errors
    ///
    /// Returns `CetdirError::Notification` if the backend fails.
    async fn lookup_token(&self, token: &str) -> Result<Option<InvitationToken>>;

    /// Marks a token as used by `account`.
    ///
    /// # Errors
    ///
    /// Returns `CetdirError::InvalidInvitationToken` for unknown tokens,
    /// `CetdirError::InvitationAlreadyClaimed` for consumed ones, or
    /// `CetdirError::Notification` if the backend fails.
    async fn consume_token(&self, token: &str, account: &str, at: DateTime<Utc>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-16T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_issue_supersedes_previous_tokens() {
        let mut ledger = TokenLedger::default();
        let record = RecordId::new("p-1");

        ledger.issue("first".to_string(), &record, t0(), Duration::hours(72));
        let receipt = ledger.issue(
            "second".to_string(),
            &record,
            t0() + Duration::hours(1),
            Duration::hours(72),
        );

        assert_eq!(receipt.expires_at, t0() + Duration::hours(73));
        assert!(ledger.find("first").unwrap().superseded);
        assert!(!ledger.find("second").unwrap().superseded);
        assert_eq!(ledger.for_record(&record).count(), 2);
    }

    #[test]
    fn test_issue_leaves_other_records_alone() {
        let mut ledger = TokenLedger::default();
        ledger.issue("a".to_string(), &RecordId::new("p-1"), t0(), Duration::hours(1));
        ledger.issue("b".to_string(), &RecordId::new("p-2"), t0(), Duration::hours(1));

        assert!(!ledger.find("a").unwrap().superseded);
    }

    #[test]
    fn test_check_claimable_rules() {
        let mut ledger = TokenLedger::default();
        let record = RecordId::new("p-1");
        ledger.issue("tok".to_string(), &record, t0(), Duration::hours(2));
        let token = ledger.find("tok").unwrap().clone();

        assert!(token.check_claimable(&record, t0() + Duration::hours(1)).is_ok());
        assert!(matches!(
            token.check_claimable(&record, t0() + Duration::hours(2)),
            Err(CetdirError::InvitationExpired)
        ));
        assert!(matches!(
            token.check_claimable(&RecordId::new("p-2"), t0()),
            Err(CetdirError::InvalidInvitationToken)
        ));
    }

    #[test]
    fn test_consume_twice_fails() {
        let mut ledger = TokenLedger::default();
        ledger.issue("tok".to_string(), &RecordId::new("p-1"), t0(), Duration::hours(2));

        ledger.consume("tok", "acct-9", t0()).unwrap();
        assert!(matches!(
            ledger.consume("tok", "acct-9", t0()),
            Err(CetdirError::InvitationAlreadyClaimed)
        ));
        assert!(matches!(
            ledger.consume("nope", "acct-9", t0()),
            Err(CetdirError::InvalidInvitationToken)
        ));
    }
}
