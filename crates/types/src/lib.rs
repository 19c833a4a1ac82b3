//! # Gitsavvy Types
//!
//! Shared type definitions for the gitsavvy CLI: the workflow schema and its
//! YAML codec, the placeholder engine, the persisted search-index snapshot,
//! captured shell commands, and the immutable configuration struct consumed
//! by the store and engine crates.

pub mod capture;
pub mod config;
pub mod index;
pub mod placeholder;
pub mod workflow;

pub use capture::CapturedCommand;
pub use config::{Config, DangerConfig, GitConfig, IdentityConfig, WorkflowsConfig};
pub use index::{INDEX_SCHEMA_VERSION, IndexEntry, IndexSnapshot};
pub use placeholder::{
    MissingPlaceholderError, Placeholder, PlaceholderMetadata, collect_from_steps, extract_placeholders, extract_with_metadata,
    substitute,
};
pub use workflow::{
    Shell, Step, StepConfirmation, WORKFLOW_SCHEMA_VERSION, Workflow, WorkflowDefaults, WorkflowError, WorkflowRef,
    validation::validate_value,
};
