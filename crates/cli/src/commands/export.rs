use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use gitsavvy_store::WorkflowStore;

#[derive(Args)]
pub struct ExportArgs {
    /// Slug of the workflow to export
    pub slug: String,
    /// Write to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(store: &WorkflowStore, args: ExportArgs) -> Result<ExitCode> {
    let reference = store
        .find_by_slug(&args.slug)?
        .with_context(|| format!("no workflow named '{}'", args.slug))?;
    let workflow = store.load(&reference)?;
    let yaml = workflow.to_yaml()?;

    match args.output {
        Some(path) => {
            fs::write(&path, &yaml).with_context(|| format!("write {}", path.display()))?;
            println!("Exported {} -> {}", reference.id, path.display());
        }
        None => print!("{yaml}"),
    }
    Ok(ExitCode::SUCCESS)
}
