use std::process::ExitCode;

use clap::{Parser, Subcommand};

use gitsavvy_store::{ProcessGit, WorkflowStore};

mod commands;
mod config;
mod prompter;

/// Curate a personal, git-managed library of shell workflows.
#[derive(Parser)]
#[command(name = "gitsavvy", version, about)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Save a workflow document into the library
    Save(commands::save::SaveArgs),
    /// List workflows
    List(commands::list::ListArgs),
    /// Fuzzy-search workflows
    Search(commands::search::SearchArgs),
    /// Run a workflow
    Run(commands::run::RunArgs),
    /// Delete a workflow and its directory
    Delete(commands::delete::DeleteArgs),
    /// Record an interactive shell session as a workflow
    Record(commands::record::RecordArgs),
    /// Ask a language-model provider to draft a workflow
    Ask(commands::ask::AskArgs),
    /// Print or write a workflow document
    Export(commands::export::ExportArgs),
    /// Commit local changes and integrate the remote
    Sync(commands::sync::SyncArgs),
    /// Inspect or rebuild the search index
    Index(commands::index::IndexArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let config = config::load_config();
    let repo_root = config::resolve_repo_root(&config);
    let store = WorkflowStore::new(&repo_root, config, Box::new(ProcessGit::new(&repo_root)));

    let result = match cli.command {
        CliCommand::Save(args) => commands::save::run(&store, args),
        CliCommand::List(args) => commands::list::run(&store, args),
        CliCommand::Search(args) => commands::search::run(&store, args),
        CliCommand::Run(args) => commands::run::run(&store, args).await,
        CliCommand::Delete(args) => commands::delete::run(&store, args),
        CliCommand::Record(args) => commands::record::run(&store, args).await,
        CliCommand::Ask(args) => commands::ask::run(&store, args),
        CliCommand::Export(args) => commands::export::run(&store, args),
        CliCommand::Sync(args) => commands::sync::run(&store, args),
        CliCommand::Index(args) => commands::index::run(&store, args),
    };

    match result {
        Ok(code) => code,
        Err(error) => {
            report_error(&error);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Single-line summary followed by the cause chain, one cause per line.
fn report_error(error: &anyhow::Error) {
    eprintln!("error: {error}");
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}
