use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use gitsavvy_engine::{ProviderRegistry, workflow_from_reply};
use gitsavvy_store::{SaveOptions, Scope, WorkflowStore, index, slug};

const SYSTEM_PROMPT: &str = "\
You draft shell workflows as YAML documents with this shape:\n\
\n\
  schema_version: 1\n\
  title: <short title>\n\
  description: <one sentence>\n\
  tags: [<tag>, ...]\n\
  placeholders:\n\
    <name>:\n\
      prompt: <question>\n\
      default: <value>\n\
  steps:\n\
    - name: <label>\n\
      command: <shell command, may reference <name> placeholders>\n\
\n\
Reply with a single fenced yaml block and nothing else.";

#[derive(Args)]
pub struct AskArgs {
    /// What the workflow should accomplish
    #[arg(required = true)]
    pub prompt: Vec<String>,
    /// Provider to draft with
    #[arg(long, default_value = "null")]
    pub provider: String,
    /// Save the draft under the draft root
    #[arg(long)]
    pub save: bool,
}

pub fn run(store: &WorkflowStore, args: AskArgs) -> Result<ExitCode> {
    let registry = ProviderRegistry::default();
    let provider = registry.create(&args.provider)?;
    let user_prompt = args.prompt.join(" ");

    let reply = provider
        .generate(SYSTEM_PROMPT, &user_prompt)
        .with_context(|| format!("provider '{}' failed", args.provider))?;
    let mut workflow = workflow_from_reply(&reply).context("provider reply did not contain a usable workflow")?;

    println!("{}", workflow.to_yaml()?);

    if args.save {
        if workflow.id.is_none() {
            workflow.id = Some(slug::timestamped_id(&workflow.title));
        }
        let options = SaveOptions {
            force: false,
            commit: store.config().git.auto_commit,
            message: Some(format!("Draft workflow: {}", workflow.title)),
        };
        let reference = store.save(&workflow, Scope::Draft, &options)?;
        let _ = index::ensure_fresh(store.repo_root(), store.config());
        println!("Draft saved to {}", reference.path.display());
    }
    Ok(ExitCode::SUCCESS)
}
