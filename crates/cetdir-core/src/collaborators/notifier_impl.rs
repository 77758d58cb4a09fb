//! Outbox invitation sender.
//!
//! Renders invitations with `cetdir-mail` and writes them to an outbox
//! directory instead of delivering them. Tokens live in `tokens.json` next
//! to the messages.

use crate::collaborators::notifier::{
    InvitationReceipt, InvitationRequest, InvitationSender, InvitationToken, TokenLedger,
};
use crate::config::CetdirConfig;
use crate::error::{CetdirError, Result};
use async_trait::async_trait;
use cetdir_mail::{InvitationContext, MailEngine, MailManager};
use chrono::{DateTime, Duration, Utc};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Invitation sender writing rendered messages to a directory.
#[derive(Debug)]
pub struct OutboxInvitationSender {
    outbox_dir: PathBuf,
    claim_base_url: String,
    ttl: Duration,
    mail: MailManager,
    lock: Mutex<()>,
}

impl OutboxInvitationSender {
    /// Creates a sender from the invitation settings of `config`.
    ///
    /// # Errors
    ///
    /// Returns `CetdirError::InvalidConfig` if the token lifetime is out of
    /// range, and `CetdirError::Mail` if the template override directory is
    /// missing or a built-in template fails to compile.
    pub fn from_config(config: &CetdirConfig) -> Result<Self> {
        config.validate()?;
        let ttl = Duration::try_hours(config.invitation.ttl_hours).ok_or_else(|| {
            CetdirError::InvalidConfig(format!(
                "invitation.ttl_hours out of range: {}",
                config.invitation.ttl_hours
            ))
        })?;

        let mail = match &config.invitation.templates_dir {
            Some(dir) => MailManager::new(dir.clone())?,
            None => MailManager::builtin()?,
        };

        Ok(Self {
            outbox_dir: config.outbox_dir.clone(),
            claim_base_url: config.invitation.claim_base_url.clone(),
            ttl,
            mail,
            lock: Mutex::new(()),
        })
    }

    /// Directory messages are written to.
    pub fn outbox_dir(&self) -> &Path {
        &self.outbox_dir
    }

    fn ledger_path(&self) -> PathBuf {
        self.outbox_dir.join("tokens.json")
    }

    fn claim_url(&self, token: &str) -> String {
        format!("{}/{}", self.claim_base_url.trim_end_matches('/'), token)
    }

    async fn load_ledger(&self) -> Result<TokenLedger> {
        match tokio::fs::read_to_string(self.ledger_path()).await {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| CetdirError::Notification(format!("corrupted token ledger: {}", e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TokenLedger::default()),
            Err(e) => Err(CetdirError::Notification(format!(
                "failed to read token ledger: {}",
                e
            ))),
        }
    }

    async fn save_ledger(&self, ledger: &TokenLedger) -> Result<()> {
        let content = serde_json::to_string_pretty(ledger)?;
        tokio::fs::write(self.ledger_path(), content)
            .await
            .map_err(|e| CetdirError::Notification(format!("failed to write token ledger: {}", e)))
    }
}

#[async_trait]
impl InvitationSender for OutboxInvitationSender {
    #[tracing::instrument(skip_all, fields(record = %request.record_id))]
    async fn send_invitation(&self, request: &InvitationRequest) -> Result<InvitationReceipt> {
        let _guard = self.lock.lock().await;
        tokio::fs::create_dir_all(&self.outbox_dir)
            .await
            .map_err(|e| CetdirError::Notification(format!("outbox unavailable: {}", e)))?;

        let token = uuid::Uuid::new_v4().simple().to_string();
        let expires_at = request
            .sent_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| CetdirError::Notification("invitation expiry out of range".to_string()))?;

        let mut context = InvitationContext::new(
            request.recipient_name.clone(),
            request.entity.as_str(),
            self.claim_url(&token),
        )
        .with_expires_at(expires_at.format("%Y-%m-%d %H:%M UTC").to_string());
        if let Some(name) = &request.admin_display_name {
            context = context.with_inviter(name.clone());
        }
        let message = self.mail.render_invitation(&context)?;

        let file_name = format!(
            "{}-{}.txt",
            request.sent_at.format("%Y%m%dT%H%M%S"),
            request.record_id
        );
        let content = format!(
            "To: {}\nSubject: {}\n\n{}\n",
            request.email, message.subject, message.body
        );
        tokio::fs::write(self.outbox_dir.join(&file_name), content)
            .await
            .map_err(|e| CetdirError::Notification(format!("failed to write invitation: {}", e)))?;

        let mut ledger = self.load_ledger().await?;
        let receipt = ledger.issue(token, &request.record_id, request.sent_at, self.ttl);
        self.save_ledger(&ledger).await?;

        tracing::info!(
            email = %request.email,
            message = %file_name,
            expires_at = %receipt.expires_at,
            "invitation written to outbox"
        );

        Ok(receipt)
    }

    async fn lookup_token(&self, token: &str) -> Result<Option<InvitationToken>> {
        let _guard = self.lock.lock().await;
        Ok(self.load_ledger().await?.find(token).cloned())
    }

    async fn consume_token(&self, token: &str, account: &str, at: DateTime<Utc>) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut ledger = self.load_ledger().await?;
        ledger.consume(token, account, at)?;
        self.save_ledger(&ledger).await
    }
}
