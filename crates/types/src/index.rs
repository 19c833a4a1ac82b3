//! Persisted search-index snapshot types.
//!
//! The index is a rebuildable JSON document summarizing every workflow on
//! disk. It exists so that listing and searching stay fast once the corpus
//! grows past a few dozen workflows; the store rebuilds it whenever it goes
//! stale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema version of the persisted index. A mismatch marks the index stale.
pub const INDEX_SCHEMA_VERSION: u32 = 1;

/// On-disk index document: `{version, updated_at, workflows[]}`, pretty-printed
/// for diffability, entries sorted by title.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexSnapshot {
    /// Index schema version; see [`INDEX_SCHEMA_VERSION`].
    pub version: u32,
    /// When the snapshot was built.
    pub updated_at: DateTime<Utc>,
    /// One entry per workflow found under the scanned roots.
    #[serde(default)]
    pub workflows: Vec<IndexEntry>,
}

impl IndexSnapshot {
    /// Create an empty snapshot stamped with the current schema version.
    pub fn empty(updated_at: DateTime<Utc>) -> Self {
        Self {
            version: INDEX_SCHEMA_VERSION,
            updated_at,
            workflows: Vec::new(),
        }
    }
}

/// Summary of one workflow, sufficient for listing and search without
/// re-parsing the YAML document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexEntry {
    /// Workflow `id` when set, else the scope-prefixed slug
    /// (`<identity_path>/<slug>` or `shared/<slug>`).
    pub id: String,
    /// Workflow title.
    pub title: String,
    /// Repo-relative path of the workflow file.
    pub path: String,
    /// Tags carried by the workflow.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Modification time of the workflow file.
    pub updated_at: DateTime<Utc>,
    /// Lowercase concatenation of title, description, tags, and step
    /// commands, used for substring and fuzzy matching.
    pub search_text: String,
}
