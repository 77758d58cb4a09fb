//! Invitation mail rendering for the CET community directory.
//!
//! This crate renders the messages sent when an admin invites the owner of a
//! persona or organization record to claim it. Templates are minijinja `.j2`
//! files, bundled with the crate or loaded from an override directory.
//!
//! # Examples
//!
//! ```
//! use cetdir_mail::{InvitationContext, MailEngine, MailManager};
//!
//! let manager = MailManager::builtin()?;
//! let context = InvitationContext::new("Taller Sur", "organizacion", "https://cet.example/reclamar/t9")
//!     .with_inviter("Laura");
//!
//! let message = manager.render_invitation(&context)?;
//! println!("{}\n\n{}", message.subject, message.body);
//! # Ok::<(), cetdir_mail::MailError>(())
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod manager;

pub use context::InvitationContext;
pub use engine::{MailEngine, RenderedInvitation};
pub use error::{MailError, Result};
pub use manager::MailManager;
