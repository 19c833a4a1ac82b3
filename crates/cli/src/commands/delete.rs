use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use dialoguer::Confirm;

use gitsavvy_store::{WorkflowStore, index};

use crate::commands::exit_code_from;

#[derive(Args)]
pub struct DeleteArgs {
    /// Slug of the workflow to delete
    pub slug: String,
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(store: &WorkflowStore, args: DeleteArgs) -> Result<ExitCode> {
    let reference = store
        .find_by_slug(&args.slug)?
        .with_context(|| format!("no workflow named '{}'", args.slug))?;

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {} and its directory?", reference.id))
            .default(false)
            .interact()?;
        if !confirmed {
            eprintln!("Aborted.");
            return Ok(exit_code_from(13));
        }
    }

    store.delete(&reference)?;

    if store.config().git.auto_commit {
        store.git().add_all()?;
        store.git().commit_all(&format!("Delete workflow: {}", reference.slug))?;
    }
    let _ = index::ensure_fresh(store.repo_root(), store.config());

    println!("Deleted {}", reference.id);
    Ok(ExitCode::SUCCESS)
}
