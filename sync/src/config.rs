//! Sync configuration management.

use serde::{Deserialize, Serialize};
use std::env;

/// Branch used when none is configured.
pub const DEFAULT_BRANCH: &str = "main";

/// Remote mirror configuration, persisted independently of the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Whether the auto-sync scheduler reacts to mutations
    #[serde(default)]
    pub enabled: bool,
    /// Repository owner
    #[serde(default)]
    pub owner: String,
    /// Repository name
    #[serde(default)]
    pub repo: String,
    /// Target branch, defaulting to `main`
    #[serde(default)]
    pub branch: String,
    /// Bearer token for the content API
    #[serde(default)]
    pub token: String,
}

impl SyncConfig {
    /// Trim every field and apply the branch default.
    pub fn normalized(mut self) -> Self {
        self.owner = self.owner.trim().to_string();
        self.repo = self.repo.trim().to_string();
        self.token = self.token.trim().to_string();
        let branch = self.branch.trim();
        self.branch = if branch.is_empty() {
            DEFAULT_BRANCH.to_string()
        } else {
            branch.to_string()
        };
        self
    }

    /// Whether every field needed for a network call is present.
    pub fn is_complete(&self) -> bool {
        !self.owner.is_empty() && !self.repo.is_empty() && !self.token.is_empty()
    }

    /// Load configuration from `TURNLOG_SYNC_*` environment variables.
    ///
    /// Absent variables leave their defaults; `TURNLOG_SYNC_ENABLED` accepts
    /// `1` or `true`.
    pub fn from_env() -> Self {
        let var = |name: &str| env::var(name).unwrap_or_default();
        let enabled = matches!(
            var("TURNLOG_SYNC_ENABLED").to_ascii_lowercase().as_str(),
            "1" | "true"
        );

        Self {
            enabled,
            owner: var("TURNLOG_SYNC_OWNER"),
            repo: var("TURNLOG_SYNC_REPO"),
            branch: var("TURNLOG_SYNC_BRANCH"),
            token: var("TURNLOG_SYNC_TOKEN"),
        }
        .normalized()
    }
}
