//! Build, load, save, and staleness-check the persisted search index.
//!
//! The index is a single pretty-printed JSON document summarizing every
//! workflow under the identity and shared roots. It is rebuilt — never
//! incrementally patched — whenever it goes stale; a full rebuild costs one
//! walk-and-parse, which is acceptable because it happens only after
//! workflow files actually change.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

use gitsavvy_types::{Config, INDEX_SCHEMA_VERSION, IndexEntry, IndexSnapshot, Workflow};

use crate::IndexError;
use crate::store::{collect_workflow_files, file_mtime, is_workflow_file};

pub mod search;

/// Absolute path of the index file for a repo + config pair.
pub fn index_file_path(repo_root: &Path, config: &Config) -> PathBuf {
    repo_root.join(&config.workflows.index_path)
}

/// Read and parse the index document at `path`.
pub fn load(path: &Path) -> Result<IndexSnapshot, IndexError> {
    if !path.exists() {
        return Err(IndexError::NotFound { path: path.to_path_buf() });
    }
    let content = fs::read_to_string(path).map_err(|source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Persist the snapshot as pretty-printed JSON for diffability.
pub fn save(path: &Path, snapshot: &IndexSnapshot) -> Result<(), IndexError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| IndexError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let content = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, content).map_err(|source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Walk both workflow roots and compose a fresh snapshot.
///
/// Parsing failures are logged and skipped: one malformed file never aborts
/// a rebuild. Entries come back sorted by title.
pub fn build(repo_root: &Path, config: &Config) -> IndexSnapshot {
    let mut entries = Vec::new();

    let workflows_root = repo_root.join(&config.workflows.root);
    let shared_root = repo_root.join(&config.workflows.shared_root);

    for root in [&workflows_root, &shared_root] {
        if !root.exists() {
            continue;
        }
        let mut files = Vec::new();
        if let Err(error) = collect_workflow_files(root, &mut files) {
            warn!(root = %root.display(), "index walk failed: {error}");
            continue;
        }
        for path in files {
            match build_entry(repo_root, config, &path) {
                Ok(entry) => entries.push(entry),
                Err(error) => warn!(path = %path.display(), "skipping unindexable workflow: {error}"),
            }
        }
    }

    entries.sort_by(|left, right| left.title.cmp(&right.title));
    debug!(count = entries.len(), "index built");

    IndexSnapshot {
        version: INDEX_SCHEMA_VERSION,
        updated_at: Utc::now(),
        workflows: entries,
    }
}

/// The index is stale when its file is missing or unreadable, its version
/// differs from the current schema, any workflow file is newer than it, or
/// an entry points at a file that no longer exists.
pub fn is_stale(repo_root: &Path, config: &Config) -> bool {
    let index_path = index_file_path(repo_root, config);
    let snapshot = match load(&index_path) {
        Ok(snapshot) => snapshot,
        Err(_) => return true,
    };
    if snapshot.version != INDEX_SCHEMA_VERSION {
        return true;
    }

    // A deleted workflow leaves no newer mtime behind; a dangling entry must
    // never be served.
    if snapshot
        .workflows
        .iter()
        .any(|entry| !repo_root.join(&entry.path).exists())
    {
        return true;
    }

    let Ok(index_mtime) = file_mtime(&index_path) else {
        return true;
    };

    for root in [
        repo_root.join(&config.workflows.root),
        repo_root.join(&config.workflows.shared_root),
    ] {
        if !root.exists() {
            continue;
        }
        if newest_workflow_mtime(&root).map(|newest| newest > index_mtime).unwrap_or(false) {
            return true;
        }
    }
    false
}

/// Load the current index, rebuilding and saving it first when stale.
pub fn ensure_fresh(repo_root: &Path, config: &Config) -> IndexSnapshot {
    let index_path = index_file_path(repo_root, config);
    if is_stale(repo_root, config) {
        let snapshot = build(repo_root, config);
        if let Err(error) = save(&index_path, &snapshot) {
            warn!("failed to persist rebuilt index: {error}");
        }
        return snapshot;
    }
    match load(&index_path) {
        Ok(snapshot) => snapshot,
        Err(error) => {
            warn!("failed to load fresh index, rebuilding: {error}");
            build(repo_root, config)
        }
    }
}

fn build_entry(repo_root: &Path, config: &Config, path: &Path) -> Result<IndexEntry, IndexError> {
    let content = fs::read_to_string(path).map_err(|source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let workflow = Workflow::from_yaml(&content).map_err(|error| {
        IndexError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, error.to_string()),
        }
    })?;

    let updated_at = file_mtime(path).map_err(|_| IndexError::NotFound { path: path.to_path_buf() })?;
    let relative = path
        .strip_prefix(repo_root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/");

    Ok(IndexEntry {
        id: workflow
            .id
            .clone()
            .unwrap_or_else(|| derive_entry_id(&relative, &config.workflows.root)),
        title: workflow.title.clone(),
        search_text: compose_search_text(&workflow),
        tags: workflow.tags,
        path: relative,
        updated_at,
    })
}

/// Scope-prefixed id for workflows without an explicit `id`:
/// `<identity_path>/<slug>` under the workflows root, `<shared_root>/<slug>`
/// otherwise. The prefix keeps identity and shared namespaces collision-free.
fn derive_entry_id(relative_path: &str, workflows_root: &str) -> String {
    let mut segments: Vec<&str> = relative_path.split('/').collect();
    segments.pop(); // workflow.yaml
    if segments.len() > 1 && segments[0] == workflows_root {
        segments.remove(0);
    }
    segments.join("/")
}

fn compose_search_text(workflow: &Workflow) -> String {
    let mut parts = vec![workflow.title.clone()];
    if let Some(description) = &workflow.description {
        parts.push(description.clone());
    }
    parts.extend(workflow.tags.iter().cloned());
    parts.extend(workflow.steps.iter().map(|step| step.command.clone()));
    parts.join(" ").to_lowercase()
}

fn newest_workflow_mtime(root: &Path) -> Option<chrono::DateTime<Utc>> {
    let mut newest = None;
    let mut files = Vec::new();
    collect_workflow_files(root, &mut files).ok()?;
    for path in files {
        if !is_workflow_file(&path) {
            continue;
        }
        if let Ok(mtime) = file_mtime(&path) {
            newest = Some(newest.map_or(mtime, |current: chrono::DateTime<Utc>| current.max(mtime)));
        }
    }
    newest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_scope_prefixed_ids() {
        assert_eq!(
            derive_entry_id("workflows/platform/alice/deploy/workflow.yaml", "workflows"),
            "platform/alice/deploy"
        );
        assert_eq!(derive_entry_id("shared/cleanup/workflow.yaml", "workflows"), "shared/cleanup");
    }

    #[test]
    fn search_text_joins_lowercased_fields() {
        let yaml_text = r#"
title: Deploy Service
description: Ship IT
tags: [K8s]
steps:
  - command: kubectl APPLY -f x.yaml
"#;
        let workflow = Workflow::from_yaml(yaml_text).expect("parse");
        let text = compose_search_text(&workflow);
        assert_eq!(text, "deploy service ship it k8s kubectl apply -f x.yaml");
    }
}
