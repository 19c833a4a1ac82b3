//! Confirmation seams.
//!
//! The engine never talks to a terminal directly: step confirmations and
//! danger prompts go through these traits so the CLI can render them with
//! its own widgets and tests can script the answers.

use anyhow::Result;

use crate::danger::DangerInfo;

/// Answer to a per-step confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDecision {
    /// Execute the step.
    Run,
    /// Skip this step and continue with the next.
    Skip,
    /// Abort the whole run.
    Quit,
}

/// Asks the user whether a step should run.
pub trait StepPrompter: Send + Sync {
    /// Present `prompt` and return the decision. Errors abort the run.
    fn confirm_step(&self, prompt: &str) -> Result<StepDecision>;
}

/// Asks the user whether a dangerous command may proceed. The default
/// answer is no.
pub trait DangerPrompt: Send + Sync {
    /// Present the matched rule and return `true` to proceed.
    fn confirm_danger(&self, danger: &DangerInfo) -> std::io::Result<bool>;
}

/// Prompter that approves everything. Used by tests and `--yes` runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl StepPrompter for AcceptAll {
    fn confirm_step(&self, _prompt: &str) -> Result<StepDecision> {
        Ok(StepDecision::Run)
    }
}

impl DangerPrompt for AcceptAll {
    fn confirm_danger(&self, _danger: &DangerInfo) -> std::io::Result<bool> {
        Ok(true)
    }
}

/// Prompter that declines everything, matching the prompt default.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclineAll;

impl StepPrompter for DeclineAll {
    fn confirm_step(&self, _prompt: &str) -> Result<StepDecision> {
        Ok(StepDecision::Quit)
    }
}

impl DangerPrompt for DeclineAll {
    fn confirm_danger(&self, _danger: &DangerInfo) -> std::io::Result<bool> {
        Ok(false)
    }
}
