//! Save, load, list, and delete operations over the on-disk workflow tree.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::warn;

use gitsavvy_types::{Config, Workflow, WorkflowError, WorkflowRef};

use crate::git::GitFacade;
use crate::index;
use crate::readme::render_readme;
use crate::slug::slugify;
use crate::StoreError;

/// Placement of a workflow inside the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Under `<workflows_root>/<identity_path>/`.
    Mine,
    /// Under `<shared_root>/`, visible to every identity.
    Shared,
    /// Under `<draft_root>/`, for LM-drafted workflows awaiting review.
    Draft,
}

/// Options controlling [`WorkflowStore::save`].
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Overwrite an existing workflow in the target directory.
    pub force: bool,
    /// Stage and commit the repository after writing.
    pub commit: bool,
    /// Commit message; defaults to `Save workflow: <title>`.
    pub message: Option<String>,
}

/// Filter applied by [`WorkflowStore::list`].
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Restrict to refs whose identity path matches these segments.
    pub identity_path: Option<String>,
    /// Restrict to a single scope; `None` walks identity and shared roots.
    pub scope: Option<Scope>,
    /// Require every tag (delegated to the index; no-op when unavailable).
    pub tags: Vec<String>,
    /// Full-text substring filter (delegated to the index; no-op when
    /// unavailable).
    pub query: Option<String>,
}

/// Filesystem-backed workflow store rooted at a git repository.
pub struct WorkflowStore {
    repo_root: PathBuf,
    config: Config,
    git: Box<dyn GitFacade>,
}

impl WorkflowStore {
    /// Create a store over `repo_root` using the provided git facade.
    pub fn new(repo_root: impl Into<PathBuf>, config: Config, git: Box<dyn GitFacade>) -> Self {
        Self {
            repo_root: repo_root.into(),
            config,
            git,
        }
    }

    /// Repository root this store operates on.
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Configuration the store was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Git facade used for auto-commit and sync.
    pub fn git(&self) -> &dyn GitFacade {
        self.git.as_ref()
    }

    /// Directory holding this identity's workflows.
    pub fn identity_dir(&self) -> PathBuf {
        let mut directory = self.repo_root.join(&self.config.workflows.root);
        if !self.config.identity.path.is_empty() {
            directory = directory.join(&self.config.identity.path);
        }
        directory
    }

    /// Directory holding shared workflows.
    pub fn shared_dir(&self) -> PathBuf {
        self.repo_root.join(&self.config.workflows.shared_root)
    }

    /// Directory holding drafted workflows.
    pub fn draft_dir(&self) -> PathBuf {
        self.repo_root.join(&self.config.workflows.draft_root)
    }

    fn scope_dir(&self, scope: Scope) -> PathBuf {
        match scope {
            Scope::Mine => self.identity_dir(),
            Scope::Shared => self.shared_dir(),
            Scope::Draft => self.draft_dir(),
        }
    }

    fn scope_prefix(&self, scope: Scope) -> String {
        match scope {
            Scope::Mine => self.config.identity.path.clone(),
            Scope::Shared => self.config.workflows.shared_root.clone(),
            Scope::Draft => self.config.workflows.draft_root.clone(),
        }
    }

    /// Validate and persist a workflow, returning its ref.
    ///
    /// The slug prefers `workflow.id` when set, else derives from the title.
    /// Saving onto an occupied slug fails unless `options.force`. The README
    /// regenerates on every save; a README write failure logs a warning and
    /// never fails the save.
    pub fn save(&self, workflow: &Workflow, scope: Scope, options: &SaveOptions) -> Result<WorkflowRef, StoreError> {
        workflow.validate()?;

        let slug = match &workflow.id {
            Some(id) => slugify(id),
            None => slugify(&workflow.title),
        };
        if slug.is_empty() {
            return Err(StoreError::Workflow(WorkflowError::Validation {
                field: "title".into(),
                message: "title yields an empty slug".into(),
            }));
        }

        let directory = self.scope_dir(scope).join(&slug);
        if existing_workflow_file(&directory).is_some() && !options.force {
            return Err(StoreError::AlreadyExists { path: directory });
        }

        fs::create_dir_all(&directory).map_err(|source| StoreError::Io {
            path: directory.clone(),
            source,
        })?;

        let workflow_path = directory.join("workflow.yaml");
        let yaml = workflow.to_yaml()?;
        write_atomic(&workflow_path, &yaml)?;

        if let Err(error) = write_atomic(&directory.join("README.md"), &render_readme(workflow)) {
            warn!(slug = %slug, "failed to write README: {error}");
        }

        if options.commit {
            self.git.add_all()?;
            let message = options
                .message
                .clone()
                .unwrap_or_else(|| format!("Save workflow: {}", workflow.title));
            self.git.commit_all(&message)?;
        }

        let updated_at = file_mtime(&workflow_path)?;
        let prefix = self.scope_prefix(scope);
        let id = workflow.id.clone().unwrap_or_else(|| {
            if prefix.is_empty() {
                slug.clone()
            } else {
                format!("{prefix}/{slug}")
            }
        });

        Ok(WorkflowRef {
            id,
            slug,
            path: workflow_path,
            updated_at,
        })
    }

    /// Read and parse the workflow a ref points at.
    pub fn load(&self, reference: &WorkflowRef) -> Result<Workflow, StoreError> {
        self.load_path(&reference.path)
    }

    /// Read and parse a workflow file directly.
    pub fn load_path(&self, path: &Path) -> Result<Workflow, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound { path: path.to_path_buf() });
        }
        let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Workflow::from_yaml(&content)?)
    }

    /// Walk the workflow roots and emit a ref for every workflow document
    /// whose enclosing path satisfies the filter.
    ///
    /// Tag and full-text filters delegate to the index; when the index is
    /// unavailable they degrade to no-ops with a logged warning.
    pub fn list(&self, filter: &ListFilter) -> Result<Vec<WorkflowRef>, StoreError> {
        let roots: Vec<(Scope, PathBuf)> = match filter.scope {
            Some(scope) => vec![(scope, self.scope_dir(scope))],
            None => vec![
                (Scope::Mine, self.repo_root.join(&self.config.workflows.root)),
                (Scope::Shared, self.shared_dir()),
            ],
        };

        let mut files = Vec::new();
        for (_, root) in &roots {
            if root.exists() {
                collect_workflow_files(root, &mut files)?;
            }
        }
        files.sort();

        let workflows_root = self.repo_root.join(&self.config.workflows.root);
        let mut refs = Vec::new();
        for path in files {
            let Some(reference) = self.ref_for_path(&path)? else {
                continue;
            };
            if let Some(wanted) = &filter.identity_path {
                let identity = identity_segments(&workflows_root, &path);
                if !segments_match(&identity, wanted) {
                    continue;
                }
            }
            refs.push(reference);
        }

        if !filter.tags.is_empty() || filter.query.is_some() {
            refs = self.apply_index_filters(refs, filter);
        }

        Ok(refs)
    }

    /// Remove the entire directory enclosing the referenced workflow:
    /// `workflow.yaml` and `README.md` go together.
    pub fn delete(&self, reference: &WorkflowRef) -> Result<(), StoreError> {
        let Some(directory) = reference.path.parent() else {
            return Err(StoreError::NotFound {
                path: reference.path.clone(),
            });
        };
        if !directory.exists() {
            return Err(StoreError::NotFound {
                path: directory.to_path_buf(),
            });
        }
        fs::remove_dir_all(directory).map_err(|source| StoreError::Io {
            path: directory.to_path_buf(),
            source,
        })
    }

    /// Find a ref by slug, searching identity workflows first, then shared,
    /// then drafts.
    pub fn find_by_slug(&self, slug: &str) -> Result<Option<WorkflowRef>, StoreError> {
        for scope in [Scope::Mine, Scope::Shared, Scope::Draft] {
            let refs = self.list(&ListFilter {
                scope: Some(scope),
                ..ListFilter::default()
            })?;
            if let Some(reference) = refs.into_iter().find(|reference| reference.slug == slug) {
                return Ok(Some(reference));
            }
        }
        Ok(None)
    }

    /// Slugs currently occupied in a scope, for unique-slug generation.
    pub fn existing_slugs(&self, scope: Scope) -> Result<Vec<String>, StoreError> {
        let refs = self.list(&ListFilter {
            scope: Some(scope),
            ..ListFilter::default()
        })?;
        Ok(refs.into_iter().map(|reference| reference.slug).collect())
    }

    fn ref_for_path(&self, path: &Path) -> Result<Option<WorkflowRef>, StoreError> {
        let Some(directory) = path.parent() else {
            return Ok(None);
        };
        let Some(slug) = directory.file_name().map(|name| name.to_string_lossy().into_owned()) else {
            return Ok(None);
        };

        let updated_at = file_mtime(path)?;
        let relative = path.strip_prefix(&self.repo_root).unwrap_or(path);
        let id = relative
            .parent()
            .map(|parent| {
                let text = parent.to_string_lossy().replace('\\', "/");
                // Drop the workflows-root prefix so identity ids read
                // `<identity>/<slug>`; shared ids keep the shared root.
                match text.strip_prefix(&format!("{}/", self.config.workflows.root)) {
                    Some(stripped) => stripped.to_string(),
                    None => text,
                }
            })
            .unwrap_or_else(|| slug.clone());

        Ok(Some(WorkflowRef {
            id,
            slug,
            path: path.to_path_buf(),
            updated_at,
        }))
    }

    fn apply_index_filters(&self, refs: Vec<WorkflowRef>, filter: &ListFilter) -> Vec<WorkflowRef> {
        let index_path = index::index_file_path(&self.repo_root, &self.config);
        let snapshot = match index::load(&index_path) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!("index unavailable, tag/text filters skipped: {error}");
                return refs;
            }
        };

        let query = filter.query.as_deref().map(str::to_lowercase);
        let wanted_tags: Vec<String> = filter.tags.iter().map(|tag| tag.trim().to_lowercase()).collect();

        let passing: Vec<&str> = snapshot
            .workflows
            .iter()
            .filter(|entry| {
                let entry_tags: Vec<String> = entry.tags.iter().map(|tag| tag.trim().to_lowercase()).collect();
                let tags_pass = wanted_tags.iter().all(|wanted| entry_tags.iter().any(|tag| tag == wanted));
                let query_pass = query
                    .as_deref()
                    .map(|needle| entry.search_text.contains(needle))
                    .unwrap_or(true);
                tags_pass && query_pass
            })
            .map(|entry| entry.path.as_str())
            .collect();

        refs.into_iter()
            .filter(|reference| {
                let relative = reference
                    .path
                    .strip_prefix(&self.repo_root)
                    .unwrap_or(&reference.path)
                    .to_string_lossy()
                    .replace('\\', "/");
                passing.iter().any(|path| *path == relative)
            })
            .collect()
    }
}

/// Return the workflow document inside `directory`, accepting both the
/// `.yaml` and `.yml` spellings.
pub(crate) fn existing_workflow_file(directory: &Path) -> Option<PathBuf> {
    for file_name in ["workflow.yaml", "workflow.yml"] {
        let candidate = directory.join(file_name);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

pub(crate) fn is_workflow_file(path: &Path) -> bool {
    matches!(
        path.file_name().and_then(|name| name.to_str()),
        Some("workflow.yaml") | Some("workflow.yml")
    )
}

pub(crate) fn collect_workflow_files(root: &Path, files: &mut Vec<PathBuf>) -> Result<(), StoreError> {
    let entries = fs::read_dir(root).map_err(|source| StoreError::Io {
        path: root.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| StoreError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_workflow_files(&path, files)?;
        } else if is_workflow_file(&path) {
            files.push(path);
        }
    }
    Ok(())
}

pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<(), StoreError> {
    let temporary_path = path.with_extension(format!(
        "{}.tmp",
        path.extension().and_then(|extension| extension.to_str()).unwrap_or("tmp")
    ));
    fs::write(&temporary_path, content).map_err(|source| StoreError::Io {
        path: temporary_path.clone(),
        source,
    })?;
    fs::rename(&temporary_path, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn file_mtime(path: &Path) -> Result<DateTime<Utc>, StoreError> {
    let metadata = fs::metadata(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let modified = metadata.modified().map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(DateTime::<Utc>::from(modified))
}

/// Identity segments of a workflow path: everything between the workflows
/// root and the `<slug>/workflow.yaml` tail.
fn identity_segments(workflows_root: &Path, path: &Path) -> Vec<String> {
    let Ok(relative) = path.strip_prefix(workflows_root) else {
        return Vec::new();
    };
    let components: Vec<String> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    if components.len() < 2 {
        return Vec::new();
    }
    components[..components.len() - 2].to_vec()
}

/// Path-segment match: `wanted` (itself `/`-separated) must appear as a
/// consecutive run inside the identity segments.
fn segments_match(identity: &[String], wanted: &str) -> bool {
    let wanted_segments: Vec<&str> = wanted.split('/').filter(|segment| !segment.is_empty()).collect();
    if wanted_segments.is_empty() {
        return true;
    }
    if wanted_segments.len() > identity.len() {
        return false;
    }
    identity
        .windows(wanted_segments.len())
        .any(|window| window.iter().map(String::as_str).eq(wanted_segments.iter().copied()))
}
