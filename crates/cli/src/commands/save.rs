use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use gitsavvy_store::{SaveOptions, Scope, WorkflowStore, index};
use gitsavvy_types::Workflow;

#[derive(Args)]
pub struct SaveArgs {
    /// Path of the workflow YAML document to save
    pub file: PathBuf,
    /// Save under the shared root instead of the identity namespace
    #[arg(long)]
    pub shared: bool,
    /// Overwrite an existing workflow with the same slug
    #[arg(long)]
    pub force: bool,
    /// Skip the automatic git commit
    #[arg(long)]
    pub no_commit: bool,
    /// Custom commit message
    #[arg(long)]
    pub message: Option<String>,
}

pub fn run(store: &WorkflowStore, args: SaveArgs) -> Result<ExitCode> {
    let content = fs::read_to_string(&args.file).with_context(|| format!("read {}", args.file.display()))?;
    let workflow = Workflow::from_yaml(&content)?;

    let scope = if args.shared { Scope::Shared } else { Scope::Mine };
    let options = SaveOptions {
        force: args.force,
        commit: store.config().git.auto_commit && !args.no_commit,
        message: args.message,
    };

    let reference = store.save(&workflow, scope, &options)?;
    let _ = index::ensure_fresh(store.repo_root(), store.config());

    println!("Saved {} -> {}", reference.id, reference.path.display());
    Ok(ExitCode::SUCCESS)
}
