//! Error types for the invitation mail crate.

use std::path::PathBuf;

/// Errors that can occur while rendering invitation messages.
#[derive(thiserror::Error, Debug)]
pub enum MailError {
    /// Template was not found among the built-in or loaded templates.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// Error occurred while rendering a template.
    #[error("template render error: {0}")]
    TemplateRenderError(String),

    /// Context is missing data the template needs.
    #[error("invalid template context: {0}")]
    InvalidTemplateContext(String),

    /// Template override directory does not exist or is not a directory.
    #[error("template directory not found: {0}")]
    TemplateDirectoryNotFound(PathBuf),

    /// Template directory listing failed.
    #[error("failed to list templates in {path}")]
    TemplateListError {
        /// Path to the template directory.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for mail operations.
pub type Result<T> = std::result::Result<T, MailError>;
