//! Configuration loading.
//!
//! The config file lives at `<config_dir>/gitsavvy/config.toml`, overridable
//! via `GITSAVVY_CONFIG_PATH`. A missing file yields defaults; a malformed
//! one logs a warning and yields defaults too — the CLI must stay usable
//! with a broken config.

use std::fs;
use std::path::PathBuf;

use dirs_next::config_dir;
use tracing::warn;

use gitsavvy_types::Config;
use gitsavvy_util::expand_tilde;

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "GITSAVVY_CONFIG_PATH";

/// Environment variable overriding the repository root.
pub const REPO_ENV: &str = "GITSAVVY_REPO";

/// Default repository location under the user's home.
pub const DEFAULT_REPO: &str = "~/.gitsavvy";

/// Default config file path.
pub fn default_config_path() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gitsavvy")
        .join("config.toml")
}

/// Load the configuration, falling back to defaults on any problem.
pub fn load_config() -> Config {
    let path = match std::env::var(CONFIG_PATH_ENV) {
        Ok(custom) if !custom.trim().is_empty() => expand_tilde(custom.trim()),
        _ => default_config_path(),
    };

    match fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => config,
            Err(error) => {
                warn!(path = %path.display(), "malformed config, using defaults: {error}");
                Config::default()
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Config::default(),
        Err(error) => {
            warn!(path = %path.display(), "unreadable config, using defaults: {error}");
            Config::default()
        }
    }
}

/// Resolve the repository root: `GITSAVVY_REPO`, then the config's `repo`,
/// then `~/.gitsavvy`.
pub fn resolve_repo_root(config: &Config) -> PathBuf {
    if let Ok(custom) = std::env::var(REPO_ENV)
        && !custom.trim().is_empty()
    {
        return expand_tilde(custom.trim());
    }
    if let Some(repo) = &config.repo {
        return expand_tilde(repo.clone());
    }
    expand_tilde(DEFAULT_REPO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_override_wins_for_repo_root() {
        temp_env::with_var(REPO_ENV, Some("/srv/workflows"), || {
            let root = resolve_repo_root(&Config::default());
            assert_eq!(root, PathBuf::from("/srv/workflows"));
        });
    }

    #[test]
    fn config_repo_wins_over_default() {
        temp_env::with_var(REPO_ENV, None::<&str>, || {
            let mut config = Config::default();
            config.repo = Some(PathBuf::from("/data/repo"));
            assert_eq!(resolve_repo_root(&config), PathBuf::from("/data/repo"));
        });
    }

    #[test]
    fn malformed_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not [valid toml").unwrap();
        temp_env::with_var(CONFIG_PATH_ENV, Some(path.to_str().unwrap()), || {
            let config = load_config();
            assert_eq!(config, Config::default());
        });
    }

    #[test]
    fn config_file_values_are_honored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[identity]\npath = \"platform/alice\"\n").unwrap();
        temp_env::with_var(CONFIG_PATH_ENV, Some(path.to_str().unwrap()), || {
            let config = load_config();
            assert_eq!(config.identity.path, "platform/alice");
        });
    }
}
