//! Configuration types for the cetdir runtime.
//!
//! Defaults are derived from a root directory. `CetdirConfig::load` overlays
//! the values found in `<root>/.cetdir/config.toml`; paths always stay
//! relative to the root the config was loaded for.

use crate::error::{CetdirError, Result};
use crate::state::EntityKind;
use serde::Deserialize;
use std::path::PathBuf;

/// Longest accepted invitation lifetime, one year.
pub const MAX_TTL_HOURS: i64 = 24 * 366;

/// Main cetdir configuration.
#[derive(Debug, Clone)]
pub struct CetdirConfig {
    /// Root directory holding all local state.
    pub root: PathBuf,

    /// Path to the configuration file (`.cetdir/config.toml`).
    pub config_file: PathBuf,

    /// JSON file backing the local record store.
    pub data_file: PathBuf,

    /// Directory where rendered invitations and the token ledger are written.
    pub outbox_dir: PathBuf,

    /// Directory backing local file storage buckets.
    pub storage_dir: PathBuf,

    /// Invitation settings.
    pub invitation: InvitationConfig,

    /// File storage settings.
    pub storage: StorageConfig,

    /// Per-entity workflow policy.
    pub policy: PolicyConfig,
}

impl CetdirConfig {
    /// Creates a configuration with defaults rooted at `root`.
    pub fn new(root: PathBuf) -> Self {
        let state_dir = root.join(".cetdir");
        Self {
            config_file: state_dir.join("config.toml"),
            data_file: state_dir.join("records.json"),
            outbox_dir: state_dir.join("outbox"),
            storage_dir: state_dir.join("storage"),
            root,
            invitation: InvitationConfig::default(),
            storage: StorageConfig::default(),
            policy: PolicyConfig::default(),
        }
    }

    /// Loads the configuration for `root`, falling back to defaults when the
    /// config file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CetdirError::ConfigUnreadable` if the file exists but cannot
    /// be read, `CetdirError::ConfigParseError` for malformed TOML, and
    /// `CetdirError::InvalidConfig` for out-of-range values.
    pub fn load(root: PathBuf) -> Result<Self> {
        let mut config = Self::new(root);
        if !config.config_file.exists() {
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config.config_file)
            .map_err(|_| CetdirError::ConfigUnreadable(config.config_file.clone()))?;
        let file: ConfigFile =
            toml::from_str(&content).map_err(|e| CetdirError::ConfigParseError(e.to_string()))?;

        config.merge(file);
        config.validate()?;

        Ok(config)
    }

    fn merge(&mut self, file: ConfigFile) {
        if let Some(invitation) = file.invitation {
            if let Some(ttl) = invitation.ttl_hours {
                self.invitation.ttl_hours = ttl;
            }
            if let Some(url) = invitation.claim_base_url {
                self.invitation.claim_base_url = url;
            }
            if let Some(dir) = invitation.templates_dir {
                self.invitation.templates_dir = Some(self.root.join(dir));
            }
        }

        if let Some(storage) = file.storage
            && let Some(url) = storage.public_base_url
        {
            self.storage.public_base_url = url;
        }

        if let Some(policy) = file.policy {
            if let Some(persona) = policy.persona {
                persona.merge_into(&mut self.policy.persona);
            }
            if let Some(organizacion) = policy.organizacion {
                organizacion.merge_into(&mut self.policy.organizacion);
            }
        }
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `CetdirError::InvalidConfig` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.invitation.ttl_hours <= 0 || self.invitation.ttl_hours > MAX_TTL_HOURS {
            return Err(CetdirError::InvalidConfig(format!(
                "invitation.ttl_hours must be between 1 and {}, got {}",
                MAX_TTL_HOURS, self.invitation.ttl_hours
            )));
        }
        if self.invitation.claim_base_url.trim().is_empty() {
            return Err(CetdirError::InvalidConfig(
                "invitation.claim_base_url is empty".to_string(),
            ));
        }
        if self.storage.public_base_url.trim().is_empty() {
            return Err(CetdirError::InvalidConfig(
                "storage.public_base_url is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Invitation settings.
#[derive(Debug, Clone)]
pub struct InvitationConfig {
    /// Lifetime of an invitation token.
    pub ttl_hours: i64,

    /// Base of the claim link; the token is appended as a path segment.
    pub claim_base_url: String,

    /// Directory of `.j2` templates overriding the built-in ones.
    pub templates_dir: Option<PathBuf>,
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            ttl_hours: 72,
            claim_base_url: "http://localhost:3000/reclamar".to_string(),
            templates_dir: None,
        }
    }
}

/// File storage settings.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Public URL prefix of uploaded objects.
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:3000/storage".to_string(),
        }
    }
}

/// Workflow behavior that differs between personas and organizations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowPolicy {
    /// Send an invitation as part of approval when the record has an email.
    pub auto_invite_on_approval: bool,

    /// Allow rejecting records that were never submitted for approval
    /// (`sin_invitacion`, `invitacion_enviada`).
    pub reject_before_approval: bool,
}

/// Workflow policy per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyConfig {
    pub persona: WorkflowPolicy,
    pub organizacion: WorkflowPolicy,
}

impl PolicyConfig {
    /// Returns the policy for `entity`.
    pub fn for_entity(&self, entity: EntityKind) -> WorkflowPolicy {
        match entity {
            EntityKind::Persona => self.persona,
            EntityKind::Organizacion => self.organizacion,
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            persona: WorkflowPolicy {
                auto_invite_on_approval: false,
                reject_before_approval: false,
            },
            organizacion: WorkflowPolicy {
                auto_invite_on_approval: true,
                reject_before_approval: true,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    invitation: Option<InvitationFile>,
    storage: Option<StorageFile>,
    policy: Option<PolicyFile>,
}

#[derive(Debug, Default, Deserialize)]
struct InvitationFile {
    ttl_hours: Option<i64>,
    claim_base_url: Option<String>,
    templates_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct StorageFile {
    public_base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PolicyFile {
    persona: Option<WorkflowPolicyFile>,
    organizacion: Option<WorkflowPolicyFile>,
}

#[derive(Debug, Default, Deserialize)]
struct WorkflowPolicyFile {
    auto_invite_on_approval: Option<bool>,
    reject_before_approval: Option<bool>,
}

impl WorkflowPolicyFile {
    fn merge_into(self, policy: &mut WorkflowPolicy) {
        if let Some(value) = self.auto_invite_on_approval {
            policy.auto_invite_on_approval = value;
        }
        if let Some(value) = self.reject_before_approval {
            policy.reject_before_approval = value;
        }
    }
}
