use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use gitsavvy_store::{ListFilter, Scope, WorkflowStore, index};

#[derive(Args)]
pub struct ListArgs {
    /// Only shared workflows
    #[arg(long, conflicts_with = "mine")]
    pub shared: bool,
    /// Only workflows under the workflows root
    #[arg(long)]
    pub mine: bool,
    /// Only workflows under a matching identity path segment
    #[arg(long)]
    pub identity: Option<String>,
    /// Require a tag (repeatable, ANDed)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Full-text substring filter
    #[arg(long)]
    pub query: Option<String>,
}

pub fn run(store: &WorkflowStore, args: ListArgs) -> Result<ExitCode> {
    // Keep the index fresh so tag/text filters see current state.
    if !args.tags.is_empty() || args.query.is_some() {
        let _ = index::ensure_fresh(store.repo_root(), store.config());
    }

    let filter = ListFilter {
        identity_path: args.identity,
        scope: if args.shared {
            Some(Scope::Shared)
        } else if args.mine {
            Some(Scope::Mine)
        } else {
            None
        },
        tags: args.tags,
        query: args.query,
    };

    let refs = store.list(&filter)?;
    if refs.is_empty() {
        println!("No workflows found.");
        return Ok(ExitCode::SUCCESS);
    }

    for reference in refs {
        let title = store
            .load(&reference)
            .map(|workflow| workflow.title)
            .unwrap_or_else(|_| "<unreadable>".to_string());
        println!(
            "{:<44} {:<32} {}",
            reference.id,
            title,
            reference.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(ExitCode::SUCCESS)
}
