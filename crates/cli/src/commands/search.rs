use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use gitsavvy_store::{MatchField, SearchFilters, WorkflowStore, fuzzy_search, index};

#[derive(Args)]
pub struct SearchArgs {
    /// Query text; omit to list everything ranked
    pub query: Option<String>,
    /// Require a tag (repeatable, ANDed)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Only shared workflows
    #[arg(long, conflicts_with = "mine")]
    pub shared: bool,
    /// Only workflows under the workflows root
    #[arg(long)]
    pub mine: bool,
    /// Exact identity path to search within
    #[arg(long)]
    pub identity: Option<String>,
    /// Maximum number of results
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

pub fn run(store: &WorkflowStore, args: SearchArgs) -> Result<ExitCode> {
    let snapshot = index::ensure_fresh(store.repo_root(), store.config());

    let filters = SearchFilters {
        query: args.query.unwrap_or_default(),
        identity_path: args.identity,
        mine: args.mine,
        shared: args.shared,
        tags: args.tags,
        max_results: args.limit,
    };

    let results = fuzzy_search(&snapshot, &filters, store.config());
    if results.is_empty() {
        println!("No matches.");
        return Ok(ExitCode::SUCCESS);
    }

    for result in results {
        let fields: Vec<&str> = result
            .matches
            .iter()
            .map(|field| match field {
                MatchField::Title => "title",
                MatchField::Tags => "tags",
                MatchField::Content => "content",
            })
            .collect();
        let annotation = if fields.is_empty() {
            String::new()
        } else {
            format!("  [{}]", fields.join(", "))
        };
        println!("{:>6.1}  {:<32} {}{}", result.score, result.entry.title, result.entry.id, annotation);
    }
    Ok(ExitCode::SUCCESS)
}
