//! File storage trait.
//!
//! Used by the admin surface to attach avatars, logos and documents to
//! records. Independent of the verification workflow.

use crate::error::{CetdirError, Result};
use async_trait::async_trait;

/// Upload progress callback, receives a percentage from 0 to 100.
pub type ProgressFn<'a> = &'a (dyn Fn(u8) + Send + Sync);

/// Object storage collaborator.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Uploads `file` as `file_name` into `bucket`/`folder` and returns its
    /// public URL.
    ///
    /// # Errors
    ///
    /// Returns `CetdirError::Storage` if the bucket or folder is invalid or
    /// the upload fails.
    async fn upload_file_to_any_bucket(
        &self,
        file: &[u8],
        file_name: &str,
        bucket: &str,
        folder: &str,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<String>;
}

/// Checks a bucket or folder path: non-empty segments, no traversal.
///
/// `folder` may be empty; `bucket` may not.
pub(crate) fn validate_location(bucket: &str, folder: &str) -> Result<()> {
    let bad_segment = |s: &str| s.is_empty() || s == "." || s == ".." || s.contains('\\');

    if bucket.is_empty() || bucket.contains('/') || bad_segment(bucket) {
        return Err(CetdirError::Storage(format!("invalid bucket: {:?}", bucket)));
    }
    if !folder.is_empty() && folder.trim_matches('/').split('/').any(bad_segment) {
        return Err(CetdirError::Storage(format!("invalid folder: {:?}", folder)));
    }
    Ok(())
}

/// Reduces a user supplied file name to a safe object name.
pub(crate) fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(['-', '.']);
    if cleaned.is_empty() {
        "archivo".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_location() {
        assert!(validate_location("avatars", "").is_ok());
        assert!(validate_location("logos", "organizaciones/2026").is_ok());
        assert!(validate_location("", "x").is_err());
        assert!(validate_location("a/b", "").is_err());
        assert!(validate_location("logos", "../secrets").is_err());
        assert!(validate_location("logos", "a//b").is_err());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Foto Perfil.PNG"), "foto-perfil.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("..."), "archivo");
    }
}
