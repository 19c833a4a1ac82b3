//! Strongly typed workflow schema definitions shared across the store, engine, and CLI.
//!
//! A workflow is the unit users author, record, search, and run: a titled,
//! tagged, ordered sequence of shell commands with optional placeholder
//! parameters. The models here preserve authoring order (via `IndexMap`) so
//! saved documents and rendered READMEs list placeholders and steps in a
//! predictable sequence.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::placeholder::Placeholder;

pub mod validation;

/// Schema version emitted into every workflow document. Documents carrying a
/// different version are rejected at parse time.
pub const WORKFLOW_SCHEMA_VERSION: u32 = 1;

/// Errors surfaced by the workflow codec.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// YAML decoding failure, annotated with line and column when available.
    #[error("{0}")]
    Parse(String),
    /// A schema invariant does not hold; `field` names the offending path.
    #[error("workflow validation failed at {field}: {message}")]
    Validation {
        /// Dotted path of the field that failed (for example, `steps[2].command`).
        field: String,
        /// Human-readable description of the violated rule.
        message: String,
    },
}

/// Describes a fully authored workflow, including metadata, placeholder
/// declarations, and sequential steps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workflow {
    /// Document schema version; see [`WORKFLOW_SCHEMA_VERSION`].
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Optional opaque identifier, lexicographically sortable. When absent,
    /// the store derives an identifier from the slug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Required human-readable title.
    #[serde(default)]
    pub title: String,
    /// Optional descriptive copy surfaced in listings and the README.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-form tags; ordering is preserved, duplicates are tolerated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Workflow-wide defaults propagated onto steps that omit them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<WorkflowDefaults>,
    /// Declared placeholder parameters keyed by name, preserving author order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub placeholders: IndexMap<String, Placeholder>,
    /// Ordered list of steps executed sequentially. At least one is required.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Workflow-wide default values applied to steps that do not override them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkflowDefaults {
    /// Default shell for steps without an explicit one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<Shell>,
    /// Default working directory for steps without an explicit one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// When true, every step without an explicit confirmation gets a plain one.
    #[serde(default, skip_serializing_if = "is_false")]
    pub confirm_each_step: bool,
}

/// A single shell command unit within a workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Step {
    /// Optional display label; listings fall back to `Step N`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Command text; may contain `<name>` placeholder tokens.
    #[serde(default)]
    pub command: String,
    /// Shell override for this step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<Shell>,
    /// Working-directory override; relative paths resolve against the repo
    /// root at run time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// Extra environment merged onto the process environment.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,
    /// When true, a non-zero exit does not stop the run.
    #[serde(default, skip_serializing_if = "is_false")]
    pub continue_on_error: bool,
    /// Per-step confirmation policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<StepConfirmation>,
}

/// Confirmation policy attached to a step: either a boolean flag or a custom
/// prompt string shown in place of the default question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StepConfirmation {
    /// `confirmation: true` / `confirmation: false`.
    Flag(bool),
    /// `confirmation: "Really deploy to production?"`.
    Prompt(String),
}

impl StepConfirmation {
    /// Returns true when the step must be confirmed before executing.
    pub fn is_required(&self) -> bool {
        match self {
            Self::Flag(enabled) => *enabled,
            Self::Prompt(_) => true,
        }
    }

    /// Custom prompt text, when one was authored.
    pub fn custom_prompt(&self) -> Option<&str> {
        match self {
            Self::Flag(_) => None,
            Self::Prompt(text) => Some(text.as_str()),
        }
    }
}

/// Shells a step may dispatch through.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Shell {
    Bash,
    Zsh,
    Sh,
    Pwsh,
}

impl Shell {
    /// Program name passed to the OS when spawning `<shell> -c <command>`.
    pub fn program(self) -> &'static str {
        match self {
            Self::Bash => "bash",
            Self::Zsh => "zsh",
            Self::Sh => "sh",
            Self::Pwsh => "pwsh",
        }
    }

    /// Parse a shell name, accepting a full path like `/bin/zsh`.
    pub fn from_name(name: &str) -> Option<Self> {
        let base = name.rsplit('/').next().unwrap_or(name);
        match base {
            "bash" => Some(Self::Bash),
            "zsh" => Some(Self::Zsh),
            "sh" => Some(Self::Sh),
            "pwsh" => Some(Self::Pwsh),
            _ => None,
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.program())
    }
}

/// Lightweight directory pointer produced by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkflowRef {
    /// Workflow identifier (explicit `id` or the scope-prefixed slug form).
    pub id: String,
    /// Directory slug under the owning namespace.
    pub slug: String,
    /// Absolute path of the `workflow.yaml` file.
    pub path: PathBuf,
    /// Modification time of the workflow file.
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Create a minimal workflow from a title and steps, stamped with the
    /// current schema version.
    pub fn new(title: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            schema_version: WORKFLOW_SCHEMA_VERSION,
            id: None,
            title: title.into(),
            description: None,
            tags: Vec::new(),
            defaults: None,
            placeholders: IndexMap::new(),
            steps,
        }
    }

    /// Decode a YAML document and validate it.
    ///
    /// Unknown fields are tolerated on read; they are dropped on the next
    /// marshal. Failures name the offending field path.
    pub fn from_yaml(content: &str) -> Result<Self, WorkflowError> {
        let workflow: Self = serde_yaml::from_str(content).map_err(|error| WorkflowError::Parse(format_yaml_error(error)))?;
        workflow.validate()?;
        Ok(workflow)
    }

    /// Marshal to stable YAML: fields in schema order, empty optionals
    /// omitted, placeholder and env mappings key-sorted.
    ///
    /// Determinism matters because workflow files are tracked in git, and a
    /// spurious reordering would produce noisy diffs on every save.
    pub fn to_yaml(&self) -> Result<String, WorkflowError> {
        let mut stable = self.clone();
        stable.placeholders.sort_keys();
        for step in &mut stable.steps {
            step.env.sort_keys();
        }
        serde_yaml::to_string(&stable).map_err(|error| WorkflowError::Parse(format!("marshal workflow: {error}")))
    }

    /// Check every schema invariant, reporting the first violation.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.schema_version != WORKFLOW_SCHEMA_VERSION {
            return Err(validation_error(
                "schema_version",
                format!(
                    "unsupported version {} (current is {})",
                    self.schema_version, WORKFLOW_SCHEMA_VERSION
                ),
            ));
        }
        if self.title.trim().is_empty() {
            return Err(validation_error("title", "title must not be empty"));
        }
        if self.steps.is_empty() {
            return Err(validation_error("steps", "at least one step is required"));
        }
        for (index, step) in self.steps.iter().enumerate() {
            if step.command.trim().is_empty() {
                return Err(validation_error(
                    format!("steps[{index}].command"),
                    "step command must not be empty",
                ));
            }
        }
        for (name, placeholder) in &self.placeholders {
            if let Some(pattern) = &placeholder.validate
                && let Err(error) = regex::Regex::new(pattern)
            {
                return Err(validation_error(
                    format!("placeholders.{name}.validate"),
                    format!("pattern does not compile: {error}"),
                ));
            }
        }
        Ok(())
    }

    /// Return a copy of `step` with workflow defaults filled in where the
    /// step left them unset.
    ///
    /// `defaults.confirm_each_step` attaches a plain (non-custom-prompt)
    /// confirmation only when the step carries none of its own.
    pub fn apply_defaults(&self, step: &Step) -> Step {
        let mut resolved = step.clone();
        let Some(defaults) = &self.defaults else {
            return resolved;
        };
        if resolved.shell.is_none() {
            resolved.shell = defaults.shell;
        }
        if resolved.cwd.is_none() {
            resolved.cwd = defaults.cwd.clone();
        }
        if resolved.confirmation.is_none() && defaults.confirm_each_step {
            resolved.confirmation = Some(StepConfirmation::Flag(true));
        }
        resolved
    }
}

impl Step {
    /// Build a bare step from command text.
    pub fn from_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }
}

fn validation_error(field: impl Into<String>, message: impl Into<String>) -> WorkflowError {
    WorkflowError::Validation {
        field: field.into(),
        message: message.into(),
    }
}

fn format_yaml_error(error: serde_yaml::Error) -> String {
    if let Some(location) = error.location() {
        return format!(
            "parse yaml workflow at line {}, column {}: {}",
            location.line(),
            location.column(),
            error
        );
    }
    format!("parse yaml workflow: {error}")
}

const fn default_schema_version() -> u32 {
    WORKFLOW_SCHEMA_VERSION
}

fn is_false(flag: &bool) -> bool {
    !*flag
}
