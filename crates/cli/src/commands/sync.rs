use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use gitsavvy_store::{IntegrateOptions, WorkflowStore, index};

#[derive(Args)]
pub struct SyncArgs {
    /// Remote to integrate from
    #[arg(long, default_value = "origin")]
    pub remote: String,
    /// Branch to integrate; defaults to the fetched head
    #[arg(long)]
    pub branch: Option<String>,
}

pub fn run(store: &WorkflowStore, args: SyncArgs) -> Result<ExitCode> {
    let git = store.git();

    let status = git.status()?;
    println!(
        "On branch {} (ahead {}, behind {})",
        if status.branch.is_empty() { "<detached>" } else { status.branch.as_str() },
        status.ahead,
        status.behind
    );

    if status.dirty {
        git.add_all()?;
        let hash = git.commit_all("Sync workflows")?;
        println!("Committed local changes: {hash}");
    }

    let outcome = git.integrate(&IntegrateOptions {
        remote: args.remote,
        branch: args.branch,
    })?;

    if !outcome.success {
        eprintln!("Integration stopped on conflicts:");
        for conflict in &outcome.conflicts {
            eprintln!("  {conflict}");
        }
        return Ok(ExitCode::FAILURE);
    }

    println!(
        "Integrated: {} new, {} updated, {} deleted",
        outcome.new_files.len(),
        outcome.updated_files.len(),
        outcome.deleted_files.len()
    );
    if let Some(hash) = &outcome.commit_hash {
        println!("HEAD is now {hash}");
    }

    let _ = index::ensure_fresh(store.repo_root(), store.config());
    Ok(ExitCode::SUCCESS)
}
