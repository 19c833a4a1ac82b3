//! Sequential workflow plan execution.
//!
//! Steps run strictly in order: defaults application, placeholder
//! substitution, cwd and shell resolution, optional confirmation, then the
//! exec primitive. A failing step stops the run unless it opted into
//! `continue_on_error`; cancellation is a fatal stop.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use gitsavvy_types::{Shell, Workflow, placeholder};

use crate::exec::{EXIT_DECLINED, EXIT_MISSING_PLACEHOLDER, ExecConfig, ExecResult, Executor, OutputSink};
use crate::prompt::{StepDecision, StepPrompter};

/// A workflow bound to its runtime inputs.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    /// The workflow to run.
    pub workflow: Workflow,
    /// Placeholder bindings.
    pub parameters: HashMap<String, String>,
    /// Base for relative step cwds.
    pub repo_root: Option<PathBuf>,
}

/// Outcome of one step.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// Zero-based step index.
    pub index: usize,
    /// Step label, when authored.
    pub name: Option<String>,
    /// Command after substitution.
    pub command: String,
    /// The user skipped this step at its confirmation prompt.
    pub skipped: bool,
    /// Exec result; `None` for skipped steps and substitution failures.
    pub exec: Option<ExecResult>,
}

impl StepOutcome {
    /// True when the step ran and exited zero.
    pub fn success(&self) -> bool {
        self.exec.as_ref().map(|exec| exec.success).unwrap_or(false)
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Every step completed (or was skipped / allowed to fail).
    pub success: bool,
    /// The run stopped on cancellation or a quit answer.
    pub canceled: bool,
    /// Exit code of the stopping step; 0 on success, 13 on quit/cancel,
    /// 21 on missing placeholders.
    pub exit_code: i32,
    /// Index of the step that stopped the run.
    pub failed_step: Option<usize>,
    /// Per-step outcomes in execution order.
    pub step_results: Vec<StepOutcome>,
    /// Wall-clock duration of the run.
    pub duration: Duration,
}

/// Drives execution plans through the exec primitive.
pub struct Runner {
    executor: Executor,
    prompter: Arc<dyn StepPrompter>,
    default_shell: Shell,
    stream: bool,
    auto_confirm: bool,
}

impl Runner {
    /// Create a runner; the default shell comes from `$SHELL`, falling back
    /// to bash.
    pub fn new(executor: Executor, prompter: Arc<dyn StepPrompter>) -> Self {
        Self {
            executor,
            prompter,
            default_shell: detect_default_shell(),
            stream: true,
            auto_confirm: false,
        }
    }

    /// Override the default shell for steps without one.
    pub fn with_default_shell(mut self, shell: Shell) -> Self {
        self.default_shell = shell;
        self
    }

    /// Stream output lines to the sink as they arrive.
    pub fn stream(mut self, enabled: bool) -> Self {
        self.stream = enabled;
        self
    }

    /// Skip every confirmation prompt.
    pub fn auto_confirm(mut self, enabled: bool) -> Self {
        self.auto_confirm = enabled;
        self
    }

    /// Run every step of the plan in order.
    pub async fn run(&self, cancel: &CancellationToken, plan: &ExecutionPlan, sink: &mut dyn OutputSink) -> RunResult {
        let started = Instant::now();
        let mut outcomes: Vec<StepOutcome> = Vec::with_capacity(plan.workflow.steps.len());

        info!(
            workflow = %plan.workflow.title,
            step_count = plan.workflow.steps.len(),
            "workflow run started"
        );

        for (index, step) in plan.workflow.steps.iter().enumerate() {
            let resolved = plan.workflow.apply_defaults(step);

            let command = match placeholder::substitute(&resolved.command, &plan.parameters) {
                Ok(command) => command,
                Err(error) => {
                    // A workflow that declares no placeholders treats stray
                    // tokens as literal text.
                    if plan.workflow.placeholders.is_empty() {
                        resolved.command.clone()
                    } else {
                        warn!(step = index, "substitution failed: {error}");
                        outcomes.push(StepOutcome {
                            index,
                            name: resolved.name.clone(),
                            command: resolved.command.clone(),
                            skipped: false,
                            exec: None,
                        });
                        return self.finish(outcomes, started, false, false, EXIT_MISSING_PLACEHOLDER, Some(index));
                    }
                }
            };

            let cwd = resolve_cwd(resolved.cwd.as_deref(), plan.repo_root.as_deref());
            let shell = resolved.shell.unwrap_or(self.default_shell);

            if let Some(confirmation) = &resolved.confirmation
                && confirmation.is_required()
                && !self.auto_confirm
            {
                let prompt = confirmation
                    .custom_prompt()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Run step {}: {}?", index + 1, command));
                match self.prompter.confirm_step(&prompt) {
                    Ok(StepDecision::Run) => {}
                    Ok(StepDecision::Skip) => {
                        debug!(step = index, "step skipped at prompt");
                        outcomes.push(StepOutcome {
                            index,
                            name: resolved.name.clone(),
                            command,
                            skipped: true,
                            exec: None,
                        });
                        continue;
                    }
                    Ok(StepDecision::Quit) => {
                        info!(step = index, "run aborted at prompt");
                        return self.finish(outcomes, started, false, true, EXIT_DECLINED, None);
                    }
                    Err(error) => {
                        warn!(step = index, "confirmation failed: {error}");
                        return self.finish(outcomes, started, false, false, 1, Some(index));
                    }
                }
            }

            let config = ExecConfig {
                command: command.clone(),
                shell: Some(shell),
                cwd,
                env: resolved.env.iter().map(|(key, value)| (key.clone(), value.clone())).collect(),
                stream: self.stream,
            };

            let exec_result = self.executor.exec(cancel, &config, sink).await;
            let step_canceled = exec_result.canceled;
            let step_success = exec_result.success;
            let step_exit = exec_result.exit_code;

            debug!(step = index, exit_code = step_exit, "step finished");
            outcomes.push(StepOutcome {
                index,
                name: resolved.name.clone(),
                command,
                skipped: false,
                exec: Some(exec_result),
            });

            if step_canceled {
                return self.finish(outcomes, started, false, true, step_exit, Some(index));
            }
            if !step_success && !resolved.continue_on_error {
                return self.finish(outcomes, started, false, false, step_exit, Some(index));
            }
        }

        self.finish(outcomes, started, true, false, 0, None)
    }

    fn finish(
        &self,
        step_results: Vec<StepOutcome>,
        started: Instant,
        success: bool,
        canceled: bool,
        exit_code: i32,
        failed_step: Option<usize>,
    ) -> RunResult {
        info!(success, canceled, exit_code, steps = step_results.len(), "workflow run finished");
        RunResult {
            success,
            canceled,
            exit_code,
            failed_step,
            step_results,
            duration: started.elapsed(),
        }
    }
}

fn resolve_cwd(step_cwd: Option<&str>, repo_root: Option<&std::path::Path>) -> Option<PathBuf> {
    let cwd = step_cwd?;
    let path = PathBuf::from(cwd);
    if path.is_relative()
        && let Some(root) = repo_root
    {
        return Some(root.join(path));
    }
    Some(path)
}

/// Shell used for steps without an explicit or default shell, from `$SHELL`.
pub fn detect_default_shell() -> Shell {
    std::env::var("SHELL")
        .ok()
        .and_then(|shell| Shell::from_name(&shell))
        .unwrap_or(Shell::Bash)
}
