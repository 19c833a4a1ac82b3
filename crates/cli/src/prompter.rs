//! Terminal implementations of the engine's confirmation seams.

use anyhow::Result;
use dialoguer::{Confirm, Select};

use gitsavvy_engine::{DangerInfo, DangerPrompt, StepDecision, StepPrompter};

/// Interactive prompter backed by dialoguer widgets.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl StepPrompter for TerminalPrompter {
    fn confirm_step(&self, prompt: &str) -> Result<StepDecision> {
        let choice = Select::new()
            .with_prompt(prompt)
            .items(&["Yes, run it", "No, skip this step", "Quit the run"])
            .default(0)
            .interact()?;
        Ok(match choice {
            0 => StepDecision::Run,
            1 => StepDecision::Skip,
            _ => StepDecision::Quit,
        })
    }
}

impl DangerPrompt for TerminalPrompter {
    fn confirm_danger(&self, danger: &DangerInfo) -> std::io::Result<bool> {
        eprintln!("Dangerous command detected: {} — {}", danger.name, danger.risk);
        eprintln!("  {}", danger.command);
        Confirm::new()
            .with_prompt("Run it anyway?")
            .default(false)
            .interact()
            .map_err(std::io::Error::other)
    }
}
