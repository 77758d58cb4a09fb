//! Mock invitation sender for testing.

use crate::collaborators::notifier::{
    InvitationReceipt, InvitationRequest, InvitationSender, InvitationToken, TokenLedger,
};
use crate::error::{CetdirError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

/// In-memory invitation sender.
///
/// Tokens are `tok-1`, `tok-2`, ... in issue order. Every request is kept so
/// tests can assert on what was dispatched.
#[derive(Debug, Clone)]
pub struct MockInvitationSender {
    ledger: Arc<Mutex<TokenLedger>>,
    sent: Arc<Mutex<Vec<InvitationRequest>>>,
    failure: Arc<Mutex<Option<String>>>,
    ttl: Duration,
}

impl Default for MockInvitationSender {
    fn default() -> Self {
        Self::with_ttl(Duration::hours(72))
    }
}

impl MockInvitationSender {
    /// Creates a sender issuing 72 hour tokens.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sender issuing tokens valid for `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(TokenLedger::default())),
            sent: Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(Mutex::new(None)),
            ttl,
        }
    }

    /// Makes dispatches fail with `message` until [`Self::recover`].
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(message.into());
    }

    /// Stops injecting failures.
    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    /// Requests dispatched so far.
    pub fn sent(&self) -> Vec<InvitationRequest> {
        self.sent.lock().unwrap().clone()
    }

    /// Most recently issued token value.
    pub fn last_token(&self) -> Option<String> {
        let count = self.sent.lock().unwrap().len();
        (count > 0).then(|| format!("tok-{}", count))
    }
}

#[async_trait]
impl InvitationSender for MockInvitationSender {
    async fn send_invitation(&self, request: &InvitationRequest) -> Result<InvitationReceipt> {
        if let Some(message) = self.failure.lock().unwrap().as_ref() {
            return Err(CetdirError::Notification(message.clone()));
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push(request.clone());
        let token = format!("tok-{}", sent.len());

        Ok(self
            .ledger
            .lock()
            .unwrap()
            .issue(token, &request.record_id, request.sent_at, self.ttl))
    }

    async fn lookup_token(&self, token: &str) -> Result<Option<InvitationToken>> {
        Ok(self.ledger.lock().unwrap().find(token).cloned())
    }

    async fn consume_token(&self, token: &str, account: &str, at: DateTime<Utc>) -> Result<()> {
        self.ledger.lock().unwrap().consume(token, account, at)
    }
}
