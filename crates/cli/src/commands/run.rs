use std::collections::HashMap;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Args;
use dialoguer::{Input, Password};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use gitsavvy_engine::{
    AcceptAll, DangerChecker, ExecutionPlan, Executor, OutputSink, RunResult, Runner, StepPrompter,
};
use gitsavvy_store::WorkflowStore;
use gitsavvy_types::{Workflow, placeholder, validate_value};
use gitsavvy_util::mask_secret;

use crate::commands::exit_code_from;
use crate::prompter::TerminalPrompter;

#[derive(Args)]
pub struct RunArgs {
    /// Workflow slug, or a path to a workflow document
    pub target: String,
    /// Placeholder binding (repeatable)
    #[arg(long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,
    /// Answer yes to every confirmation, including danger prompts
    #[arg(long, short = 'y')]
    pub yes: bool,
    /// Buffer output instead of streaming it
    #[arg(long)]
    pub no_stream: bool,
}

/// Sink printing streamed lines to stdout as they arrive.
struct StdoutSink;

impl OutputSink for StdoutSink {
    fn line(&mut self, line: &str) {
        println!("{line}");
    }
}

pub async fn run(store: &WorkflowStore, args: RunArgs) -> Result<ExitCode> {
    let workflow = resolve_target(store, &args.target)?;
    let mut parameters = parse_params(&args.params)?;
    fill_missing_parameters(&workflow, &mut parameters, args.yes)?;

    let checker = DangerChecker::new(store.config().danger.allow.clone());
    let executor = Executor::new()
        .with_danger(checker, Arc::new(TerminalPrompter))
        .auto_confirm(args.yes);
    let prompter: Arc<dyn StepPrompter> = if args.yes {
        Arc::new(AcceptAll)
    } else {
        Arc::new(TerminalPrompter)
    };
    let runner = Runner::new(executor, prompter).stream(!args.no_stream).auto_confirm(args.yes);

    let plan = ExecutionPlan {
        workflow,
        parameters,
        repo_root: Some(store.repo_root().to_path_buf()),
    };

    let cancel = CancellationToken::new();
    let cancel_on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_on_interrupt.cancel();
        }
    });

    let mut sink = StdoutSink;
    let result = runner.run(&cancel, &plan, &mut sink).await;
    summarize(&result);
    Ok(exit_code_from(result.exit_code))
}

fn resolve_target(store: &WorkflowStore, target: &str) -> Result<Workflow> {
    let path = Path::new(target);
    if path.is_file() {
        return Ok(store.load_path(path)?);
    }
    let reference = store
        .find_by_slug(target)?
        .with_context(|| format!("no workflow named '{target}'"))?;
    Ok(store.load(&reference)?)
}

fn parse_params(raw: &[String]) -> Result<HashMap<String, String>> {
    let mut parameters = HashMap::new();
    for pair in raw {
        let Some((name, value)) = pair.split_once('=') else {
            bail!("invalid --param '{pair}'; expected NAME=VALUE");
        };
        parameters.insert(name.trim().to_string(), value.to_string());
    }
    Ok(parameters)
}

/// Prompt for declared placeholders that are used by some step and still
/// unbound. In `--yes` mode defaults fill in silently; anything else left
/// unbound surfaces as exit 21 from the runner.
fn fill_missing_parameters(workflow: &Workflow, parameters: &mut HashMap<String, String>, assume_yes: bool) -> Result<()> {
    for (name, metadata) in placeholder::extract_with_metadata(workflow) {
        if parameters.contains_key(&name) || metadata.used_in.is_empty() {
            continue;
        }

        if assume_yes {
            if let Some(default) = metadata.default {
                parameters.insert(name, default);
            }
            continue;
        }

        let label = metadata.prompt.clone().unwrap_or_else(|| name.clone());
        let value = loop {
            let candidate: String = if metadata.secret {
                Password::new().with_prompt(&label).interact()?
            } else {
                let mut input = Input::<String>::new().with_prompt(&label);
                if let Some(default) = &metadata.default {
                    input = input.default(default.clone());
                }
                input.interact_text()?
            };

            match &metadata.validate {
                Some(pattern) => match validate_value(&candidate, pattern) {
                    Ok(()) => break candidate,
                    Err(message) => {
                        let shown = if metadata.secret { mask_secret(&candidate) } else { candidate };
                        warn!(placeholder = %name, value = %shown, "rejected: {message}");
                        eprintln!("{message}");
                    }
                },
                None => break candidate,
            }
        };
        parameters.insert(name, value);
    }
    Ok(())
}

fn summarize(result: &RunResult) {
    let ran = result.step_results.iter().filter(|step| step.exec.is_some()).count();
    let skipped = result.step_results.iter().filter(|step| step.skipped).count();
    let seconds = result.duration.as_secs_f64();

    if result.canceled {
        eprintln!("Run canceled after {ran} step(s) ({seconds:.1}s).");
    } else if result.success {
        println!("Run succeeded: {ran} step(s) run, {skipped} skipped ({seconds:.1}s).");
    } else {
        let failed = result
            .failed_step
            .map(|index| format!("step {}", index + 1))
            .unwrap_or_else(|| "a step".to_string());
        eprintln!("Run failed at {failed} (exit {}).", result.exit_code);
    }
}

#[cfg(test)]
mod tests {
    use super::parse_params;

    #[test]
    fn parses_name_value_pairs() {
        let parameters = parse_params(&["name=world".into(), "region=us-east-1".into()]).expect("parse");
        assert_eq!(parameters["name"], "world");
        assert_eq!(parameters["region"], "us-east-1");
    }

    #[test]
    fn keeps_equals_signs_in_values() {
        let parameters = parse_params(&["expr=a=b".into()]).expect("parse");
        assert_eq!(parameters["expr"], "a=b");
    }

    #[test]
    fn rejects_pairs_without_equals() {
        assert!(parse_params(&["plain".into()]).is_err());
    }
}
