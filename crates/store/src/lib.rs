//! # Gitsavvy Store
//!
//! Filesystem-backed, git-managed persistence for workflows, plus the
//! rebuildable search index over them.
//!
//! The on-disk layout roots everything at the configured repo path:
//!
//! ```text
//! <repo>/<workflows_root>/<identity_path>/<slug>/workflow.yaml
//! <repo>/<workflows_root>/<identity_path>/<slug>/README.md
//! <repo>/<shared_root>/<slug>/workflow.yaml
//! <repo>/<index_path>
//! ```
//!
//! The store assumes single-writer semantics per workflow directory; files
//! are written whole through a temp-file + rename, so concurrent readers
//! observe either the old or the new document, never a torn state.

use std::path::PathBuf;

use thiserror::Error;

use gitsavvy_types::WorkflowError;

pub mod git;
pub mod index;
pub mod readme;
pub mod slug;
pub mod store;

pub use git::{GitFacade, IntegrateOptions, IntegrateOutcome, NoopGit, ProcessGit, RepoStatus};
pub use index::search::{MatchField, SearchFilters, SearchMatch, fuzzy_search};
pub use readme::render_readme;
pub use slug::{generate_unique_slug, slugify, timestamped_id};
pub use store::{ListFilter, SaveOptions, Scope, WorkflowStore};

/// Errors surfaced by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A ref points at a file that no longer exists.
    #[error("workflow not found at {path}")]
    NotFound {
        /// Path that was expected to exist.
        path: PathBuf,
    },
    /// Save without `force` onto a slug that already holds a workflow.
    #[error("workflow already exists at {path}; pass force to overwrite")]
    AlreadyExists {
        /// Directory already holding a workflow document.
        path: PathBuf,
    },
    /// The document failed to parse or validate.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    /// Filesystem failure, annotated with the path involved.
    #[error("store I/O error at {path}: {source}")]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
    /// The git subprocess failed or produced unusable output.
    #[error("git: {0}")]
    Git(String),
}

/// Errors surfaced by index operations. These are non-fatal at the store
/// boundary: filters degrade to pass-all with a logged warning.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Index file missing from disk.
    #[error("index file not found at {path}")]
    NotFound {
        /// Expected index location.
        path: PathBuf,
    },
    /// Filesystem failure while reading or writing the index.
    #[error("index I/O error at {path}: {source}")]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
    /// The index document did not parse.
    #[error("index parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
