//! Immutable configuration consumed by the store and engine.
//!
//! The CLI loads this from `config.toml` (see the cli crate); the core
//! crates receive it fully constructed and never mutate it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Path of the git repository holding the workflow library. When unset,
    /// the CLI resolves `~/.gitsavvy` (overridable via `GITSAVVY_REPO`).
    pub repo: Option<PathBuf>,
    /// Layout of the workflow tree inside the repo.
    pub workflows: WorkflowsConfig,
    /// Namespace separating this user's workflows within a shared repo.
    pub identity: IdentityConfig,
    /// Git behavior toggles.
    pub git: GitConfig,
    /// Dangerous-command detector adjustments.
    pub danger: DangerConfig,
}

/// Directory layout inside the repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WorkflowsConfig {
    /// Root directory of identity-scoped workflows, relative to the repo.
    pub root: String,
    /// Root directory of shared workflows, relative to the repo.
    pub shared_root: String,
    /// Directory for LM-drafted workflows awaiting review.
    pub draft_root: String,
    /// Location of the index file, relative to the repo.
    pub index_path: String,
}

impl Default for WorkflowsConfig {
    fn default() -> Self {
        Self {
            root: "workflows".into(),
            shared_root: "shared".into(),
            draft_root: "drafts".into(),
            index_path: ".index.json".into(),
        }
    }
}

/// Identity namespace, e.g. `platform/alice`. May contain multiple path
/// segments; empty means the bare workflows root.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IdentityConfig {
    pub path: String,
}

/// Git behavior toggles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GitConfig {
    /// Commit automatically after every save.
    pub auto_commit: bool,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self { auto_commit: true }
    }
}

/// Dangerous-command detector adjustments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DangerConfig {
    /// Rule names the user has allowlisted; matching commands run without a
    /// danger prompt. Useful for the home-directory move rule, which
    /// false-positives on legitimate moves.
    pub allow: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_standard_layout() {
        let config = Config::default();
        assert_eq!(config.workflows.root, "workflows");
        assert_eq!(config.workflows.shared_root, "shared");
        assert_eq!(config.workflows.index_path, ".index.json");
        assert!(config.git.auto_commit);
        assert!(config.identity.path.is_empty());
    }

    #[test]
    fn partial_toml_fills_missing_sections() {
        let parsed: Config = toml::from_str(
            r#"
[identity]
path = "platform/alice"

[git]
auto_commit = false
"#,
        )
        .expect("parse config");
        assert_eq!(parsed.identity.path, "platform/alice");
        assert!(!parsed.git.auto_commit);
        assert_eq!(parsed.workflows.root, "workflows");
    }
}
