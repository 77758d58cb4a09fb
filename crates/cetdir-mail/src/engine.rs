//! Invitation rendering trait.

use crate::context::InvitationContext;
use crate::error::Result;
use serde::Serialize;

/// A rendered invitation, ready to hand to a delivery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedInvitation {
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Trait for rendering invitation templates.
///
/// # Examples
///
/// ```
/// use cetdir_mail::{InvitationContext, MailEngine, MailManager};
///
/// let manager = MailManager::builtin()?;
/// let context = InvitationContext::new("Ana", "persona", "https://cet.example/reclamar/abc");
/// let message = manager.render_invitation(&context)?;
/// assert!(message.body.contains("https://cet.example/reclamar/abc"));
/// # Ok::<(), cetdir_mail::MailError>(())
/// ```
pub trait MailEngine {
    /// Renders a named template with the provided context.
    ///
    /// # Errors
    ///
    /// Returns `MailError::TemplateNotFound` if the template does not exist,
    /// or `MailError::TemplateRenderError` if rendering fails.
    fn render<T: Serialize>(&self, template: &str, ctx: &T) -> Result<String>;

    /// Renders the invitation message for the context's entity.
    ///
    /// # Errors
    ///
    /// Returns `MailError::InvalidTemplateContext` if the context has no
    /// claim URL or entity, otherwise the errors of [`MailEngine::render`].
    fn render_invitation(&self, ctx: &InvitationContext) -> Result<RenderedInvitation>;

    /// Lists available template names, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the template directory cannot be read.
    fn list_templates(&self) -> Result<Vec<String>>;
}
