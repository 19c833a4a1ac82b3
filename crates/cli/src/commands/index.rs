use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Subcommand};

use gitsavvy_store::{WorkflowStore, index};

#[derive(Args)]
pub struct IndexArgs {
    #[command(subcommand)]
    pub command: IndexCommand,
}

#[derive(Subcommand)]
pub enum IndexCommand {
    /// Rebuild the index from the workflow tree
    Rebuild,
    /// Report index freshness and size
    Status,
}

pub fn run(store: &WorkflowStore, args: IndexArgs) -> Result<ExitCode> {
    let repo_root = store.repo_root();
    let config = store.config();
    let index_path = index::index_file_path(repo_root, config);

    match args.command {
        IndexCommand::Rebuild => {
            let snapshot = index::build(repo_root, config);
            index::save(&index_path, &snapshot)?;
            println!("Indexed {} workflow(s) -> {}", snapshot.workflows.len(), index_path.display());
        }
        IndexCommand::Status => {
            let stale = index::is_stale(repo_root, config);
            match index::load(&index_path) {
                Ok(snapshot) => println!(
                    "{} entries, built {}, {}",
                    snapshot.workflows.len(),
                    snapshot.updated_at.format("%Y-%m-%d %H:%M:%S"),
                    if stale { "stale" } else { "fresh" }
                ),
                Err(error) => println!("No usable index ({error}); run `gitsavvy index rebuild`."),
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
