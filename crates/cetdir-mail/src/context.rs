//! Context structures for invitation rendering.

use serde::Serialize;

/// Data provided to invitation templates.
///
/// # Examples
///
/// ```
/// use cetdir_mail::InvitationContext;
///
/// let context = InvitationContext::new("Ana Pérez", "persona", "https://cet.example/reclamar/abc")
///     .with_inviter("Mesa de ayuda")
///     .with_expires_at("2026-10-19 12:00 UTC");
/// assert_eq!(context.inviter_name.as_deref(), Some("Mesa de ayuda"));
/// ```
#[derive(Debug, Clone, Default, Serialize)]
pub struct InvitationContext {
    /// Name shown in the greeting.
    pub recipient_name: String,

    /// Entity wire name (`persona` or `organizacion`), selects the template.
    pub entity: String,

    /// Link the recipient follows to claim the record.
    pub claim_url: String,

    /// Human readable expiry of the invitation token.
    pub expires_at: String,

    /// Display name of the admin who sent the invitation, if known.
    pub inviter_name: Option<String>,
}

impl InvitationContext {
    /// Creates a context with the required fields.
    #[must_use]
    pub fn new(
        recipient_name: impl Into<String>,
        entity: impl Into<String>,
        claim_url: impl Into<String>,
    ) -> Self {
        Self {
            recipient_name: recipient_name.into(),
            entity: entity.into(),
            claim_url: claim_url.into(),
            ..Default::default()
        }
    }

    /// Sets the inviting admin's display name.
    #[must_use]
    pub fn with_inviter(mut self, name: impl Into<String>) -> Self {
        self.inviter_name = Some(name.into());
        self
    }

    /// Sets the rendered expiry.
    #[must_use]
    pub fn with_expires_at(mut self, expires_at: impl Into<String>) -> Self {
        self.expires_at = expires_at.into();
        self
    }

    /// Name of the template used for this context.
    pub fn template_name(&self) -> String {
        format!("invitacion_{}", self.entity)
    }
}
