use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use gitsavvy_engine::{RecorderError, WorkflowSeed, commands_to_workflow, detect_recording_shell, record_session};
use gitsavvy_store::{SaveOptions, Scope, WorkflowStore, index, slug};
use gitsavvy_types::Shell;

use crate::commands::exit_code_from;

#[derive(Args)]
pub struct RecordArgs {
    /// Title for the recorded workflow; derived from the first command when
    /// omitted
    #[arg(long)]
    pub title: Option<String>,
    /// Description for the recorded workflow
    #[arg(long)]
    pub description: Option<String>,
    /// Tag for the recorded workflow (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Shell to record with (bash or zsh); defaults to $SHELL
    #[arg(long)]
    pub shell: Option<String>,
    /// Save under the shared root
    #[arg(long)]
    pub shared: bool,
    /// Print the workflow instead of saving it
    #[arg(long)]
    pub no_save: bool,
}

pub async fn run(store: &WorkflowStore, args: RecordArgs) -> Result<ExitCode> {
    let shell = match &args.shell {
        Some(name) => Shell::from_name(name).with_context(|| format!("unknown shell '{name}'"))?,
        None => detect_recording_shell(),
    };

    println!("Recording a {shell} session; exit the shell to finish.");
    let session = match record_session(shell).await {
        Ok(session) => session,
        Err(RecorderError::NothingCaptured) => {
            eprintln!("No commands were captured.");
            return Ok(exit_code_from(13));
        }
        Err(other) => return Err(other.into()),
    };
    println!("Captured {} command(s).", session.commands.len());

    let seed = WorkflowSeed {
        title: args.title,
        description: args.description,
        tags: args.tags,
    };
    let mut workflow = commands_to_workflow(&session.commands, session.shell, seed);
    workflow.id = Some(slug::timestamped_id(&workflow.title));

    if args.no_save {
        println!("{}", workflow.to_yaml()?);
        return Ok(ExitCode::SUCCESS);
    }

    let scope = if args.shared { Scope::Shared } else { Scope::Mine };
    let options = SaveOptions {
        force: false,
        commit: store.config().git.auto_commit,
        message: None,
    };
    let reference = store.save(&workflow, scope, &options)?;
    let _ = index::ensure_fresh(store.repo_root(), store.config());

    println!("Saved {} -> {}", reference.id, reference.path.display());
    Ok(ExitCode::SUCCESS)
}
