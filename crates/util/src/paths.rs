//! Filesystem path helpers.

use dirs_next::home_dir;
use std::path::PathBuf;

/// Expand a leading `~` or `~/` to the user's home directory.
///
/// Paths without a tilde prefix are returned unchanged. When the home
/// directory cannot be resolved, the input is returned as-is.
pub fn expand_tilde(path: impl Into<PathBuf>) -> PathBuf {
    let path = path.into();
    let Some(first) = path.components().next() else {
        return path;
    };
    if first.as_os_str() != "~" {
        return path;
    }

    let input = path.to_string_lossy();
    let trimmed = input.trim();

    if trimmed == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = trimmed.strip_prefix("~/") {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    if let Some(rest) = trimmed.strip_prefix("~\\") {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }

    PathBuf::from(trimmed)
}

#[cfg(test)]
mod tests {
    use super::expand_tilde;
    use std::path::PathBuf;

    #[test]
    fn leaves_plain_paths_alone() {
        assert_eq!(expand_tilde("/var/data"), PathBuf::from("/var/data"));
        assert_eq!(expand_tilde("relative/path"), PathBuf::from("relative/path"));
    }

    #[test]
    #[cfg(unix)]
    fn expands_tilde_prefix() {
        temp_env::with_var("HOME", Some("/home/alice"), || {
            assert_eq!(expand_tilde("~/workflows"), PathBuf::from("/home/alice/workflows"));
        });
    }

    #[test]
    #[cfg(unix)]
    fn bare_tilde_becomes_home() {
        temp_env::with_var("HOME", Some("/home/alice"), || {
            assert_eq!(expand_tilde("~"), PathBuf::from("/home/alice"));
        });
    }
}
