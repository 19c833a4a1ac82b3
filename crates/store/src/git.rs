//! Narrow git facade used by the store.
//!
//! The store only needs staging, commits, status, and remote integration;
//! everything richer stays out of scope. `ProcessGit` shells out to the
//! `git` binary so the store works against whatever git the user already
//! trusts; `NoopGit` satisfies the contract without side effects for tests
//! and for configurations with auto-commit disabled.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::StoreError;

/// Repository status summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoStatus {
    /// Current branch name.
    pub branch: String,
    /// Whether the working tree has uncommitted changes.
    pub dirty: bool,
    /// Commits ahead of the upstream branch.
    pub ahead: u32,
    /// Commits behind the upstream branch.
    pub behind: u32,
}

/// Options controlling [`GitFacade::integrate`].
#[derive(Debug, Clone)]
pub struct IntegrateOptions {
    /// Remote to fetch from.
    pub remote: String,
    /// Branch to integrate; defaults to the current branch's upstream.
    pub branch: Option<String>,
}

impl Default for IntegrateOptions {
    fn default() -> Self {
        Self {
            remote: "origin".into(),
            branch: None,
        }
    }
}

/// Result of an integrate run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrateOutcome {
    /// Whether the merge completed without conflicts.
    pub success: bool,
    /// Files added by the integration.
    pub new_files: Vec<String>,
    /// Files modified by the integration.
    pub updated_files: Vec<String>,
    /// Files removed by the integration.
    pub deleted_files: Vec<String>,
    /// Conflicted paths, when the merge stopped.
    pub conflicts: Vec<String>,
    /// HEAD commit hash after a successful integration.
    pub commit_hash: Option<String>,
}

/// The git operations the store depends on.
pub trait GitFacade: Send + Sync {
    /// Initialize a repository at the facade's root.
    fn init(&self) -> Result<(), StoreError>;
    /// Stage a single path.
    fn add(&self, path: &Path) -> Result<(), StoreError>;
    /// Stage every change under the root.
    fn add_all(&self) -> Result<(), StoreError>;
    /// Commit all staged changes, returning the commit hash.
    fn commit_all(&self, message: &str) -> Result<String, StoreError>;
    /// Summarize branch and working-tree state.
    fn status(&self) -> Result<RepoStatus, StoreError>;
    /// Fetch and merge remote changes.
    fn integrate(&self, options: &IntegrateOptions) -> Result<IntegrateOutcome, StoreError>;
}

/// Facade backed by the `git` binary.
pub struct ProcessGit {
    root: PathBuf,
}

impl ProcessGit {
    /// Create a facade operating on the repository at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn run(&self, args: &[&str]) -> Result<String, StoreError> {
        debug!(?args, root = %self.root.display(), "running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|error| StoreError::Git(format!("spawn git {}: {error}", args.join(" "))))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StoreError::Git(format!(
                "git {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn head_hash(&self) -> Result<String, StoreError> {
        Ok(self.run(&["rev-parse", "HEAD"])?.trim().to_string())
    }
}

impl GitFacade for ProcessGit {
    fn init(&self) -> Result<(), StoreError> {
        self.run(&["init"]).map(|_| ())
    }

    fn add(&self, path: &Path) -> Result<(), StoreError> {
        let path_text = path.to_string_lossy();
        self.run(&["add", "--", path_text.as_ref()]).map(|_| ())
    }

    fn add_all(&self) -> Result<(), StoreError> {
        self.run(&["add", "--all"]).map(|_| ())
    }

    fn commit_all(&self, message: &str) -> Result<String, StoreError> {
        self.run(&["commit", "-m", message])?;
        self.head_hash()
    }

    fn status(&self) -> Result<RepoStatus, StoreError> {
        let output = self.run(&["status", "--porcelain=v2", "--branch"])?;
        Ok(parse_porcelain_status(&output))
    }

    fn integrate(&self, options: &IntegrateOptions) -> Result<IntegrateOutcome, StoreError> {
        self.run(&["fetch", options.remote.as_str()])?;

        let merge_ref = match &options.branch {
            Some(branch) => format!("{}/{}", options.remote, branch),
            None => "FETCH_HEAD".to_string(),
        };

        // Classify incoming changes before touching the working tree.
        let mut outcome = IntegrateOutcome::default();
        if let Ok(diff) = self.run(&["diff", "--name-status", &format!("HEAD...{merge_ref}")]) {
            classify_name_status(&diff, &mut outcome);
        }

        match self.run(&["merge", "--no-edit", &merge_ref]) {
            Ok(_) => {
                outcome.success = true;
                outcome.commit_hash = Some(self.head_hash()?);
            }
            Err(_) => {
                outcome.success = false;
                if let Ok(unmerged) = self.run(&["diff", "--name-only", "--diff-filter=U"]) {
                    outcome.conflicts = unmerged.lines().map(str::to_string).collect();
                }
            }
        }
        Ok(outcome)
    }
}

/// Facade that accepts every call and does nothing. Used in tests and when
/// auto-commit is disabled.
#[derive(Debug, Default)]
pub struct NoopGit;

impl GitFacade for NoopGit {
    fn init(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn add(&self, _path: &Path) -> Result<(), StoreError> {
        Ok(())
    }

    fn add_all(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn commit_all(&self, _message: &str) -> Result<String, StoreError> {
        Ok(String::new())
    }

    fn status(&self) -> Result<RepoStatus, StoreError> {
        Ok(RepoStatus::default())
    }

    fn integrate(&self, _options: &IntegrateOptions) -> Result<IntegrateOutcome, StoreError> {
        Ok(IntegrateOutcome {
            success: true,
            ..IntegrateOutcome::default()
        })
    }
}

fn parse_porcelain_status(output: &str) -> RepoStatus {
    let mut status = RepoStatus::default();
    for line in output.lines() {
        if let Some(branch) = line.strip_prefix("# branch.head ") {
            status.branch = branch.trim().to_string();
        } else if let Some(counts) = line.strip_prefix("# branch.ab ") {
            for part in counts.split_whitespace() {
                if let Some(ahead) = part.strip_prefix('+') {
                    status.ahead = ahead.parse().unwrap_or(0);
                } else if let Some(behind) = part.strip_prefix('-') {
                    status.behind = behind.parse().unwrap_or(0);
                }
            }
        } else if !line.starts_with('#') && !line.trim().is_empty() {
            status.dirty = true;
        }
    }
    status
}

fn classify_name_status(diff: &str, outcome: &mut IntegrateOutcome) {
    for line in diff.lines() {
        let mut fields = line.split_whitespace();
        let Some(kind) = fields.next() else { continue };
        let Some(path) = fields.next() else { continue };
        match kind.chars().next() {
            Some('A') => outcome.new_files.push(path.to_string()),
            Some('M') | Some('R') => outcome.updated_files.push(path.to_string()),
            Some('D') => outcome.deleted_files.push(path.to_string()),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_porcelain_branch_and_counts() {
        let output = "# branch.oid deadbeef\n# branch.head main\n# branch.upstream origin/main\n# branch.ab +2 -1\n1 .M N... 100644 100644 100644 abc def workflows/x/workflow.yaml\n";
        let status = parse_porcelain_status(output);
        assert_eq!(status.branch, "main");
        assert_eq!(status.ahead, 2);
        assert_eq!(status.behind, 1);
        assert!(status.dirty);
    }

    #[test]
    fn clean_tree_reports_not_dirty() {
        let status = parse_porcelain_status("# branch.head main\n# branch.ab +0 -0\n");
        assert!(!status.dirty);
        assert_eq!(status.ahead, 0);
    }

    #[test]
    fn classifies_name_status_lines() {
        let mut outcome = IntegrateOutcome::default();
        classify_name_status("A\tworkflows/a/workflow.yaml\nM\tworkflows/b/workflow.yaml\nD\told/workflow.yaml\n", &mut outcome);
        assert_eq!(outcome.new_files, vec!["workflows/a/workflow.yaml"]);
        assert_eq!(outcome.updated_files, vec!["workflows/b/workflow.yaml"]);
        assert_eq!(outcome.deleted_files, vec!["old/workflow.yaml"]);
    }

    #[test]
    fn noop_git_accepts_everything() {
        let git = NoopGit;
        git.init().unwrap();
        git.add_all().unwrap();
        assert_eq!(git.commit_all("msg").unwrap(), "");
        assert!(git.integrate(&IntegrateOptions::default()).unwrap().success);
    }
}
